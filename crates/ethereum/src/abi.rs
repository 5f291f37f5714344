//! Ethereum ABI parser
//!
//! Turns the interface description emitted by the compiler into
//! [`FunctionDescriptor`]s.

use serde_json::Value;
use sha3::{Digest, Keccak256};
use sol2js_core::{AbiInput, Error, FunctionDescriptor, FunctionKind, Result};

/// Ethereum ABI parser
#[derive(Debug, Default, Clone, Copy)]
pub struct AbiParser;

impl AbiParser {
    /// Create a new parser instance
    pub fn new() -> Self {
        Self
    }

    /// Parse an ABI from JSON text
    pub fn parse_content(&self, content: &str) -> Result<Vec<FunctionDescriptor>> {
        let value: Value = serde_json::from_str(content)?;
        self.parse_value(&value)
    }

    /// Parse an ABI value; older compilers embed the array as a JSON string
    pub fn parse_value(&self, value: &Value) -> Result<Vec<FunctionDescriptor>> {
        match value {
            Value::String(text) => self.parse_content(text),
            Value::Array(items) => items.iter().map(|item| self.parse_entry(item)).collect(),
            _ => Err(Error::parse("ABI must be an array")),
        }
    }

    /// Normalise an ABI value to the array form
    pub fn normalize(&self, value: &Value) -> Result<Value> {
        match value {
            Value::String(text) => {
                let inner: Value = serde_json::from_str(text)?;
                self.normalize(&inner)
            }
            Value::Array(_) => Ok(value.clone()),
            _ => Err(Error::parse("ABI must be an array")),
        }
    }

    /// Parse one ABI entry
    fn parse_entry(&self, value: &Value) -> Result<FunctionDescriptor> {
        let kind = FunctionKind::from(
            value.get("type")
                .and_then(|v| v.as_str())
                .unwrap_or("function"),
        );

        let name = value.get("name")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        let inputs = value.get("inputs")
            .and_then(|v| v.as_array())
            .map(|arr| Self::parse_parameters(arr))
            .transpose()?
            .unwrap_or_default();

        let outputs = value.get("outputs")
            .and_then(|v| v.as_array())
            .map(|arr| Self::parse_parameters(arr))
            .transpose()?
            .unwrap_or_default();

        let state_mutability = value.get("stateMutability")
            .and_then(|v| v.as_str())
            .unwrap_or_else(|| {
                // Legacy support
                if value.get("constant").and_then(|v| v.as_bool()).unwrap_or(false) {
                    "view"
                } else if value.get("payable").and_then(|v| v.as_bool()).unwrap_or(false) {
                    "payable"
                } else {
                    "nonpayable"
                }
            })
            .to_string();

        let payable = state_mutability == "payable";

        Ok(FunctionDescriptor {
            name,
            kind,
            inputs,
            outputs,
            state_mutability,
            payable,
        })
    }

    /// Parse a parameter list, recursing into tuple components
    fn parse_parameters(array: &[Value]) -> Result<Vec<AbiInput>> {
        let mut parameters = Vec::with_capacity(array.len());

        for param in array {
            let name = param.get("name")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();

            let param_type = param.get("type")
                .and_then(|v| v.as_str())
                .ok_or_else(|| Error::parse(format!("Parameter '{}' must have a type", name)))?
                .to_string();

            let internal_type = param.get("internalType")
                .and_then(|v| v.as_str())
                .map(String::from);

            let components = if param_type.starts_with("tuple") {
                param.get("components")
                    .and_then(|v| v.as_array())
                    .map(|arr| Self::parse_parameters(arr))
                    .transpose()?
            } else {
                None
            };

            parameters.push(AbiInput {
                name,
                param_type,
                internal_type,
                components,
            });
        }

        Ok(parameters)
    }
}

/// Canonical type of a parameter, expanding tuples into their components
pub fn canonical_type(param: &AbiInput) -> String {
    match (param.param_type.strip_prefix("tuple"), &param.components) {
        (Some(suffix), Some(components)) => {
            let inner: Vec<String> = components.iter().map(canonical_type).collect();
            format!("({}){}", inner.join(","), suffix)
        }
        _ => param.param_type.clone(),
    }
}

/// Canonical signature, e.g. `setValue(uint256)`
pub fn function_signature(function: &FunctionDescriptor) -> String {
    let types: Vec<String> = function.inputs.iter().map(canonical_type).collect();
    format!("{}({})", function.name, types.join(","))
}

/// 4-byte selector of a function, `0x` prefixed
pub fn function_selector(function: &FunctionDescriptor) -> String {
    let hash = Keccak256::digest(function_signature(function).as_bytes());
    format!("0x{}", hex::encode(&hash[..4]))
}
