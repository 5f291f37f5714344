//! Contract artifact types shared by the compiler, deployer and generator

use std::collections::btree_map::{self, BTreeMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of an ABI entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FunctionKind {
    Function,
    Constructor,
    Event,
    Fallback,
    Receive,
    Error,
    Other(String),
}

impl FunctionKind {
    /// ABI spelling of the kind
    pub fn as_str(&self) -> &str {
        match self {
            FunctionKind::Function => "function",
            FunctionKind::Constructor => "constructor",
            FunctionKind::Event => "event",
            FunctionKind::Fallback => "fallback",
            FunctionKind::Receive => "receive",
            FunctionKind::Error => "error",
            FunctionKind::Other(kind) => kind,
        }
    }
}

impl From<&str> for FunctionKind {
    fn from(s: &str) -> Self {
        match s {
            "function" => FunctionKind::Function,
            "constructor" => FunctionKind::Constructor,
            "event" => FunctionKind::Event,
            "fallback" => FunctionKind::Fallback,
            "receive" => FunctionKind::Receive,
            "error" => FunctionKind::Error,
            other => FunctionKind::Other(other.to_string()),
        }
    }
}

impl From<String> for FunctionKind {
    fn from(s: String) -> Self {
        FunctionKind::from(s.as_str())
    }
}

impl From<FunctionKind> for String {
    fn from(kind: FunctionKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for FunctionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ABI parameter definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiInput {
    /// Parameter name, empty when the ABI leaves it unnamed
    pub name: String,
    /// Parameter type (e.g., uint256, address, tuple[])
    #[serde(rename = "type")]
    pub param_type: String,
    /// Internal type (for structs and custom types)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_type: Option<String>,
    /// Components (for tuples and structs)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<AbiInput>>,
}

/// One entry of a contract interface description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDescriptor {
    /// Entry name; constructors, fallbacks and receives have none
    pub name: String,
    /// Entry kind
    pub kind: FunctionKind,
    /// Declared inputs, in order
    pub inputs: Vec<AbiInput>,
    /// Declared outputs, in order
    pub outputs: Vec<AbiInput>,
    /// State mutability (pure, view, nonpayable, payable)
    pub state_mutability: String,
    /// Whether the entry accepts a value transfer
    pub payable: bool,
}

impl FunctionDescriptor {
    /// Whether this entry produces a bound method and hook
    pub fn is_bindable(&self) -> bool {
        self.kind == FunctionKind::Function
    }

    /// Whether the entry is read-only (view or pure)
    pub fn is_read_only(&self) -> bool {
        self.state_mutability == "view" || self.state_mutability == "pure"
    }
}

/// A compiled contract as it moves through the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractArtifact {
    /// Contract name, unique within a set
    pub name: String,
    /// Source unit the contract was defined in
    pub source: String,
    /// Parsed interface description
    pub abi: Vec<FunctionDescriptor>,
    /// ABI exactly as the compiler emitted it
    pub raw_abi: Value,
    /// Creation bytecode, hex without prefix
    pub bytecode: String,
    /// Whether the contract should be deployed and bound
    pub deployable: bool,
    /// Address once deployed
    pub address: Option<String>,
}

impl ContractArtifact {
    /// Entries that produce a bound method and hook
    pub fn bindable_functions(&self) -> impl Iterator<Item = &FunctionDescriptor> {
        self.abi.iter().filter(|f| f.is_bindable())
    }

    /// Whether any ABI entry is literally named `name`
    pub fn declares(&self, name: &str) -> bool {
        self.abi.iter().any(|f| f.name == name)
    }
}

/// Contracts of one compilation run, keyed by name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractSet {
    contracts: BTreeMap<String, ContractArtifact>,
}

impl ContractSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a contract, returning the one it replaced
    pub fn insert(&mut self, artifact: ContractArtifact) -> Option<ContractArtifact> {
        self.contracts.insert(artifact.name.clone(), artifact)
    }

    pub fn get(&self, name: &str) -> Option<&ContractArtifact> {
        self.contracts.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ContractArtifact> {
        self.contracts.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.contracts.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    /// Contract names in order
    pub fn names(&self) -> Vec<&str> {
        self.contracts.keys().map(|s| s.as_str()).collect()
    }

    pub fn iter(&self) -> btree_map::Values<'_, String, ContractArtifact> {
        self.contracts.values()
    }

    /// Contracts tagged deployable
    pub fn deployable(&self) -> impl Iterator<Item = &ContractArtifact> {
        self.contracts.values().filter(|c| c.deployable)
    }

    /// Drop every contract not tagged deployable
    pub fn retain_deployable(&mut self) {
        self.contracts.retain(|_, c| c.deployable);
    }
}

impl<'a> IntoIterator for &'a ContractSet {
    type Item = &'a ContractArtifact;
    type IntoIter = btree_map::Values<'a, String, ContractArtifact>;

    fn into_iter(self) -> Self::IntoIter {
        self.contracts.values()
    }
}

impl FromIterator<ContractArtifact> for ContractSet {
    fn from_iter<I: IntoIterator<Item = ContractArtifact>>(iter: I) -> Self {
        let mut set = ContractSet::new();
        for artifact in iter {
            set.insert(artifact);
        }
        set
    }
}
