//! Contract extraction from `solc --combined-json` output

use std::path::Path;

use serde_json::Value;
use sol2js_core::{ContractArtifact, ContractSet, Error, Result};
use tracing::{debug, error, warn};

use crate::abi::AbiParser;

/// Name of the marker interface that is never deployed
pub const MARKER_INTERFACE: &str = "Deployable";

/// ABI entry name that tags a contract as deployable
pub const MARKER_FUNCTION: &str = "deployable";

/// Builds a [`ContractSet`] from the compiler's combined output
#[derive(Debug, Default)]
pub struct ContractExtractor {
    parser: AbiParser,
}

impl ContractExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read and extract a combined JSON file
    pub async fn extract_file(&self, path: &Path) -> Result<ContractSet> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            let err = Error::io(format!("Failed to read {}: {}", path.display(), e));
            error!("{}", err);
            err
        })?;
        self.extract_content(&content)
    }

    /// Extract from combined JSON text
    pub fn extract_content(&self, content: &str) -> Result<ContractSet> {
        let value: Value = serde_json::from_str(content)?;
        self.extract(&value)
    }

    /// Extract every contract except the marker interface, tagging deployable ones
    pub fn extract(&self, combined: &Value) -> Result<ContractSet> {
        let contracts = combined.get("contracts")
            .and_then(|v| v.as_object())
            .ok_or_else(|| Error::parse("Compiler output has no 'contracts' object"))?;

        let mut set = ContractSet::new();

        for (key, entry) in contracts {
            let (source, name) = split_contract_key(key);

            if is_marker_interface(source, name) {
                debug!("Skipping marker interface {}", key);
                continue;
            }

            let raw_abi = entry.get("abi")
                .ok_or_else(|| Error::parse(format!("Contract {} has no ABI", key)))
                .and_then(|abi| self.parser.normalize(abi))?;
            let abi = self.parser.parse_value(&raw_abi)?;

            let bytecode = entry.get("bin")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .trim_start_matches("0x")
                .to_string();

            let mut artifact = ContractArtifact {
                name: name.to_string(),
                source: source.to_string(),
                abi,
                raw_abi,
                bytecode,
                deployable: false,
                address: None,
            };

            artifact.deployable = artifact.declares(MARKER_FUNCTION);
            if artifact.deployable && artifact.bytecode.is_empty() {
                warn!(
                    "{} declares {}() but has no bytecode (interface or abstract contract), not deploying it",
                    key, MARKER_FUNCTION
                );
                artifact.deployable = false;
            }

            if let Some(previous) = set.insert(artifact) {
                warn!(
                    "Contract name {} is defined in both {} and {}, keeping the definition from {}",
                    name, previous.source, source, source
                );
            }
        }

        Ok(set)
    }
}

/// Split `path/to/File.sol:Name` into source and contract name
pub fn split_contract_key(key: &str) -> (&str, &str) {
    key.rsplit_once(':').unwrap_or(("", key))
}

/// The marker interface is excluded by file basename or by contract name
pub fn is_marker_interface(source: &str, name: &str) -> bool {
    let basename = Path::new(source)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("");

    basename == format!("{}.sol", MARKER_INTERFACE) || name == MARKER_INTERFACE
}
