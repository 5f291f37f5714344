//! Compile, extract, deploy and generate, in that order

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use sol2js_core::{ContractSet, Error, Result, Sol2JsConfig};
use tracing::{error, info, warn};

use crate::codegen::{BindingGenerator, CodegenConfig};
use crate::compiler::{source_stem, SolcCompiler};
use crate::deployer::{self, ContractDeployer, DeploymentPlan};
use crate::extractor::ContractExtractor;

/// Everything a pipeline run produced
#[derive(Debug, Clone)]
pub struct CompileOutput {
    /// Deployable contracts, with addresses when deployed
    pub contracts: ContractSet,
    /// Deployment tasks and their outcomes
    pub plan: DeploymentPlan,
    /// Renamed compiler output
    pub artifact_path: PathBuf,
    pub bindings_path: PathBuf,
    pub hooks_path: PathBuf,
}

/// Switches for a top-level compile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    /// Connect to the configured node and deploy
    pub deploy: bool,
    /// Render bindings without writing them
    pub dry_run: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            deploy: true,
            dry_run: false,
        }
    }
}

/// One compilation run over a single source file
pub struct CompilePipeline<'a> {
    config: &'a Sol2JsConfig,
    deployer: Option<&'a dyn ContractDeployer>,
    dry_run: bool,
}

impl<'a> CompilePipeline<'a> {
    /// A pipeline that generates bindings without deploying
    pub fn new(config: &'a Sol2JsConfig) -> Self {
        Self {
            config,
            deployer: None,
            dry_run: false,
        }
    }

    /// Deploy through `deployer` before generating
    pub fn with_deployer(mut self, deployer: &'a dyn ContractDeployer) -> Self {
        self.deployer = Some(deployer);
        self
    }

    /// Render bindings without writing them
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub async fn run(&self, source: &Path, out_dir: &Path) -> Result<CompileOutput> {
        let out_dir = resolve_out_dir(out_dir);
        let compiler = SolcCompiler::new(self.config.compiler.clone());

        compiler.ensure_installed().await?;
        let artifact_path = compiler.compile(source, &out_dir).await?;

        let mut contracts = ContractExtractor::new().extract_file(&artifact_path).await?;
        contracts.retain_deployable();
        if contracts.is_empty() {
            warn!("No contract in {} declares a deployable() marker", source.display());
        }

        let mut plan = DeploymentPlan::from_contracts(&contracts);
        match self.deployer {
            Some(deployer) => {
                plan.execute(&contracts, deployer).await?;
                plan.apply(&mut contracts);
            }
            None => info!("Skipping deployment of {} contract(s)", plan.tasks().len()),
        }

        let generator = BindingGenerator::new(self.codegen_config(source, &out_dir)?)?;
        generator.generate_all(&contracts).await?;

        Ok(CompileOutput {
            contracts,
            plan,
            artifact_path,
            bindings_path: generator.bindings_path(),
            hooks_path: generator.hooks_path(),
        })
    }

    fn codegen_config(&self, source: &Path, out_dir: &Path) -> Result<CodegenConfig> {
        codegen_config(self.config, source, out_dir, self.dry_run)
    }
}

/// Compile, deploy to the configured node and generate bindings
pub async fn compile(source: impl AsRef<Path>, out_dir: impl AsRef<Path>, config: &Sol2JsConfig) -> Result<ContractSet> {
    compile_with(source, out_dir, config, CompileOptions::default()).await
}

/// [`compile`] with deployment and writing switchable
pub async fn compile_with(
    source: impl AsRef<Path>,
    out_dir: impl AsRef<Path>,
    config: &Sol2JsConfig,
    options: CompileOptions,
) -> Result<ContractSet> {
    let result = async {
        let deployer = if options.deploy {
            Some(deployer::connect(&config.chain).await?)
        } else {
            None
        };

        let mut pipeline = CompilePipeline::new(config).dry_run(options.dry_run);
        if let Some(deployer) = &deployer {
            pipeline = pipeline.with_deployer(&**deployer);
        }
        pipeline.run(source.as_ref(), out_dir.as_ref()).await
    }
    .await;

    match result {
        Ok(output) => Ok(output.contracts),
        Err(e) => {
            error!("compilation failed: {}", e);
            Err(e)
        }
    }
}

/// Regenerate bindings from an existing compiler artifact, without compiling or deploying
pub async fn generate_from_artifact(
    artifact_path: &Path,
    out_dir: &Path,
    addresses: &BTreeMap<String, String>,
    config: &Sol2JsConfig,
    dry_run: bool,
) -> Result<ContractSet> {
    let out_dir = resolve_out_dir(out_dir);

    let mut contracts = ContractExtractor::new().extract_file(artifact_path).await?;
    contracts.retain_deployable();

    for (name, address) in addresses {
        match contracts.get_mut(name) {
            Some(artifact) => artifact.address = Some(address.clone()),
            None => warn!("Ignoring address for {}: not a deployable contract in {}", name, artifact_path.display()),
        }
    }

    let generator = BindingGenerator::new(codegen_config(config, artifact_path, &out_dir, dry_run)?)?;
    generator.generate_all(&contracts).await?;

    Ok(contracts)
}

fn codegen_config(config: &Sol2JsConfig, source: &Path, out_dir: &Path, dry_run: bool) -> Result<CodegenConfig> {
    let source_name = source
        .file_name()
        .and_then(|s| s.to_str())
        .ok_or_else(|| Error::validation(format!("Invalid source file name: {}", source.display())))?;

    Ok(CodegenConfig {
        output_dir: out_dir.to_path_buf(),
        module_name: source_stem(source)?,
        source: source_name.to_string(),
        bindings: config.bindings.clone(),
        dry_run,
    })
}

/// An empty output directory means the current one
pub fn resolve_out_dir(out_dir: &Path) -> PathBuf {
    if out_dir.as_os_str().is_empty() {
        PathBuf::from("./")
    } else {
        out_dir.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_out_dir() {
        assert_eq!(resolve_out_dir(Path::new("")), PathBuf::from("./"));
        assert_eq!(resolve_out_dir(Path::new("build")), PathBuf::from("build"));
    }

    #[test]
    fn test_codegen_config_uses_source_stem() {
        let config = Sol2JsConfig::default();
        let codegen = codegen_config(&config, Path::new("contracts/Market.sol"), Path::new("out"), false).unwrap();

        assert_eq!(codegen.module_name, "Market");
        assert_eq!(codegen.source, "Market.sol");
        assert_eq!(codegen.output_dir, PathBuf::from("out"));
        assert!(!codegen.dry_run);
    }

    #[test]
    fn test_compile_options_default_to_deploying() {
        let options = CompileOptions::default();
        assert!(options.deploy);
        assert!(!options.dry_run);
    }
}
