//! Intermediate representation of the generated bindings
//!
//! The IR lists, per contract, the members to emit. Templates render it in a
//! single pass, so member order and parameter lists are decided here and
//! nowhere else.

use std::collections::HashSet;

use convert_case::{Case, Casing};
use serde::Serialize;
use serde_json::{json, Map, Value};
use sol2js_core::{AbiInput, ContractArtifact, ContractSet, FunctionDescriptor};

use crate::abi::{function_selector, function_signature};

/// Trailing parameter added to payable members
pub const OVERRIDES_PARAM: &str = "overrides";

/// One bound method and its hook
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoundMember {
    /// Function name, used for the method and the forwarded call
    pub name: String,
    /// Hook identifier, `use<Contract><Function>`
    pub hook_name: String,
    /// Declared parameters in order, `overrides` last when payable
    pub params: Vec<String>,
    /// Parameters joined for a declaration or call site
    pub arguments: String,
    /// Hook effect dependencies, the params without `overrides`
    pub dependencies: Vec<String>,
    /// Canonical signature
    pub signature: String,
    /// 4-byte selector
    pub selector: String,
    pub payable: bool,
    pub read_only: bool,
}

impl BoundMember {
    /// Build the member for one function descriptor
    pub fn from_descriptor(contract: &str, function: &FunctionDescriptor) -> Self {
        let mut params: Vec<String> = function.inputs.iter().map(param_name).collect();
        let dependencies = params.clone();
        if function.payable {
            params.push(OVERRIDES_PARAM.to_string());
        }

        Self {
            name: function.name.clone(),
            arguments: params.join(", "),
            dependencies,
            hook_name: format!("use{}{}", contract, function.name.to_case(Case::Pascal)),
            params,
            signature: function_signature(function),
            selector: function_selector(function),
            payable: function.payable,
            read_only: function.is_read_only(),
        }
    }
}

/// `<type>_<name>`, verbatim from the ABI
pub fn param_name(input: &AbiInput) -> String {
    format!("{}_{}", input.param_type, input.name)
}

/// Bindings of one contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractBinding {
    pub name: String,
    pub address: Option<String>,
    pub members: Vec<BoundMember>,
}

impl ContractBinding {
    /// Overloads after the first get their input types appended to the hook name
    pub fn from_artifact(artifact: &ContractArtifact) -> Self {
        let mut taken = HashSet::new();
        let mut members = Vec::new();

        for function in artifact.bindable_functions() {
            let mut member = BoundMember::from_descriptor(&artifact.name, function);
            if !taken.insert(member.hook_name.clone()) {
                let base = format!("{}{}", member.hook_name, overload_suffix(function));
                let mut candidate = base.clone();
                let mut index = 2;
                while !taken.insert(candidate.clone()) {
                    candidate = format!("{}{}", base, index);
                    index += 1;
                }
                member.hook_name = candidate;
            }
            members.push(member);
        }

        Self {
            name: artifact.name.clone(),
            address: artifact.address.clone(),
            members,
        }
    }
}

/// `safeTransferFrom(address,address,uint256,bytes)` -> `AddressAddressUint256Bytes`
fn overload_suffix(function: &FunctionDescriptor) -> String {
    function
        .inputs
        .iter()
        .map(|input| {
            let ty = input.param_type.replace("[]", "Array");
            let ty: String = ty.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
            ty.to_case(Case::Pascal)
        })
        .collect()
}

/// Everything one generation run emits
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BindingModule {
    /// Source file the contracts were compiled from
    pub source: String,
    pub contracts: Vec<ContractBinding>,
    /// `abi`, `bin` and `address` per contract, embedded in the bindings module
    pub table: Value,
}

impl BindingModule {
    /// Build the IR for every contract tagged deployable
    pub fn from_contracts(source: &str, contracts: &ContractSet) -> Self {
        let mut table = Map::new();
        let mut bindings = Vec::new();

        for artifact in contracts.deployable() {
            table.insert(
                artifact.name.clone(),
                json!({
                    "abi": artifact.raw_abi,
                    "bin": artifact.bytecode,
                    "address": artifact.address,
                }),
            );
            bindings.push(ContractBinding::from_artifact(artifact));
        }

        Self {
            source: source.to_string(),
            contracts: bindings,
            table: Value::Object(table),
        }
    }

    /// Total number of bound members
    pub fn member_count(&self) -> usize {
        self.contracts.iter().map(|c| c.members.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sol2js_core::FunctionKind;

    fn descriptor(name: &str, kind: &str, payable: bool, inputs: &[(&str, &str)]) -> FunctionDescriptor {
        FunctionDescriptor {
            name: name.to_string(),
            kind: FunctionKind::from(kind),
            inputs: inputs
                .iter()
                .map(|(ty, name)| AbiInput {
                    name: name.to_string(),
                    param_type: ty.to_string(),
                    internal_type: None,
                    components: None,
                })
                .collect(),
            outputs: Vec::new(),
            state_mutability: if payable { "payable" } else { "nonpayable" }.to_string(),
            payable,
        }
    }

    fn artifact(name: &str, abi: Vec<FunctionDescriptor>, deployable: bool) -> ContractArtifact {
        ContractArtifact {
            name: name.to_string(),
            source: "Market.sol".to_string(),
            abi,
            raw_abi: Value::Array(Vec::new()),
            bytecode: "6080".to_string(),
            deployable,
            address: None,
        }
    }

    #[test]
    fn test_one_member_per_function_entry() {
        let abi = vec![
            descriptor("", "constructor", false, &[("address", "owner")]),
            descriptor("list", "function", false, &[("uint256", "price")]),
            descriptor("Listed", "event", false, &[("uint256", "price")]),
            descriptor("", "fallback", true, &[]),
            descriptor("", "receive", true, &[]),
            descriptor("buy", "function", true, &[("uint256", "id")]),
            descriptor("SoldOut", "error", false, &[]),
        ];
        let binding = ContractBinding::from_artifact(&artifact("Market", abi, true));

        let names: Vec<&str> = binding.members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["list", "buy"]);
    }

    #[test]
    fn test_payable_adds_one_parameter() {
        let inputs = [("address", "to"), ("uint256", "amount")];
        let plain = BoundMember::from_descriptor("Vault", &descriptor("send", "function", false, &inputs));
        let payable = BoundMember::from_descriptor("Vault", &descriptor("send", "function", true, &inputs));

        assert_eq!(plain.params, vec!["address_to", "uint256_amount"]);
        assert_eq!(payable.params.len(), plain.params.len() + 1);
        assert_eq!(payable.params.last().map(String::as_str), Some(OVERRIDES_PARAM));
        assert_eq!(payable.arguments, "address_to, uint256_amount, overrides");
    }

    #[test]
    fn test_hook_names() {
        let member = BoundMember::from_descriptor("SimpleStorage", &descriptor("setValue", "function", true, &[]));
        assert_eq!(member.hook_name, "useSimpleStorageSetValue");

        let member = BoundMember::from_descriptor("ERC20", &descriptor("balanceOf", "function", false, &[]));
        assert_eq!(member.hook_name, "useERC20BalanceOf");
    }

    #[test]
    fn test_overloads_get_distinct_hook_names() {
        let abi = vec![
            descriptor(
                "safeTransferFrom",
                "function",
                false,
                &[("address", "from"), ("address", "to"), ("uint256", "tokenId")],
            ),
            descriptor(
                "safeTransferFrom",
                "function",
                false,
                &[("address", "from"), ("address", "to"), ("uint256", "tokenId"), ("bytes", "data")],
            ),
        ];
        let binding = ContractBinding::from_artifact(&artifact("Nft", abi, true));

        let hooks: Vec<&str> = binding.members.iter().map(|m| m.hook_name.as_str()).collect();
        assert_eq!(
            hooks,
            vec!["useNftSafeTransferFrom", "useNftSafeTransferFromAddressAddressUint256Bytes"]
        );
        assert!(binding.members.iter().all(|m| m.name == "safeTransferFrom"));
    }

    #[test]
    fn test_identical_overload_suffixes_are_numbered() {
        let abi = vec![
            descriptor("mint", "function", false, &[]),
            descriptor("mint", "function", false, &[("uint256[]", "ids")]),
            descriptor("mint", "function", false, &[("uint256[]", "amounts")]),
        ];
        let binding = ContractBinding::from_artifact(&artifact("Token", abi, true));

        let hooks: Vec<&str> = binding.members.iter().map(|m| m.hook_name.as_str()).collect();
        assert_eq!(
            hooks,
            vec!["useTokenMint", "useTokenMintUint256Array", "useTokenMintUint256Array2"]
        );
    }

    #[test]
    fn test_overrides_is_not_a_dependency() {
        let member = BoundMember::from_descriptor(
            "Vault",
            &descriptor("deposit", "function", true, &[("uint256", "amount")]),
        );

        assert_eq!(member.params, vec!["uint256_amount", "overrides"]);
        assert_eq!(member.dependencies, vec!["uint256_amount"]);
    }

    #[test]
    fn test_untagged_contracts_are_skipped() {
        let mut set = ContractSet::new();
        set.insert(artifact("Market", vec![descriptor("list", "function", false, &[])], true));
        set.insert(artifact("Math", vec![descriptor("add", "function", false, &[])], false));

        let module = BindingModule::from_contracts("Market.sol", &set);
        assert_eq!(module.contracts.len(), 1);
        assert_eq!(module.member_count(), 1);
        assert!(module.table.get("Math").is_none());
        assert_eq!(module.table["Market"]["bin"], "6080");
        assert!(module.table["Market"]["address"].is_null());
    }

    #[test]
    fn test_empty_abi_emits_no_members() {
        let mut set = ContractSet::new();
        set.insert(artifact("Empty", vec![descriptor("", "constructor", false, &[])], true));

        let module = BindingModule::from_contracts("Empty.sol", &set);
        assert_eq!(module.contracts.len(), 1);
        assert_eq!(module.member_count(), 0);
    }
}
