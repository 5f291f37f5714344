//! Solidity compilation, EVM deployment and JavaScript binding generation

pub mod abi;
pub mod codegen;
pub mod compiler;
pub mod deployer;
pub mod extractor;
pub mod pipeline;

pub use abi::AbiParser;
pub use codegen::{BindingGenerator, CodegenConfig};
pub use compiler::SolcCompiler;
pub use deployer::{ContractDeployer, DeploymentPlan, DeploymentReceipt, EthersDeployer};
pub use extractor::ContractExtractor;
pub use pipeline::{compile, compile_with, generate_from_artifact, CompileOptions, CompileOutput, CompilePipeline};
