//! Code generation for deployed contracts
//!
//! This module generates JavaScript bindings from contract ABIs: a wrapper
//! class per contract and a data-fetch hook per function.

pub mod generator;
pub mod ir;
pub mod templates;

pub use generator::{BindingGenerator, GeneratedBindings};
pub use ir::{BindingModule, BoundMember, ContractBinding};

use std::path::PathBuf;

use sol2js_core::config::BindingsConfig;

/// Configuration for binding generation
#[derive(Debug, Clone)]
pub struct CodegenConfig {
    /// Output directory for generated code
    pub output_dir: PathBuf,
    /// File stem of the generated modules
    pub module_name: String,
    /// Source file named in the generated headers
    pub source: String,
    /// Context imports and hooks directory
    pub bindings: BindingsConfig,
    /// Whether this is a dry run
    pub dry_run: bool,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./"),
            module_name: "contracts".to_string(),
            source: String::new(),
            bindings: BindingsConfig::default(),
            dry_run: false,
        }
    }
}
