/// Core types, errors and configuration for sol2js
pub mod config;
pub mod error;
pub mod types;

pub use config::{ConfigValidator, Sol2JsConfig};
pub use error::{Error, Result};
pub use types::{AbiInput, ContractArtifact, ContractSet, FunctionDescriptor, FunctionKind};
