//! Binding generator
//!
//! Builds the IR for a contract set and renders the bindings and hooks
//! modules from it.

use std::path::{Path, PathBuf};

use serde::Serialize;
use sol2js_core::config::ContextImport;
use sol2js_core::{ContractSet, Error, Result};
use tracing::{error, info};

use super::ir::{BindingModule, ContractBinding};
use super::templates::{TemplateManager, BINDINGS_TEMPLATE, HOOKS_TEMPLATE};
use super::CodegenConfig;

/// Rendered output of one generation run
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedBindings {
    pub module: BindingModule,
    /// Bindings module text
    pub bindings: String,
    /// Hooks module text
    pub hooks: String,
}

#[derive(Serialize)]
struct RenderContext<'a> {
    source: &'a str,
    table: String,
    contracts: &'a [ContractBinding],
    wallet_context: &'a ContextImport,
    dapp_context: &'a ContextImport,
}

/// Code generator for contract bindings
pub struct BindingGenerator {
    config: CodegenConfig,
    templates: TemplateManager,
}

impl BindingGenerator {
    /// Create a new code generator with the given configuration
    pub fn new(config: CodegenConfig) -> Result<Self> {
        Ok(Self {
            config,
            templates: TemplateManager::new()?,
        })
    }

    /// `<output_dir>/<module>.js`
    pub fn bindings_path(&self) -> PathBuf {
        self.config.output_dir.join(format!("{}.js", self.config.module_name))
    }

    /// `<output_dir>/<hooks_dir>/<module>.js`
    pub fn hooks_path(&self) -> PathBuf {
        self.config
            .output_dir
            .join(&self.config.bindings.hooks_dir)
            .join(format!("{}.js", self.config.module_name))
    }

    /// Render both modules without touching the filesystem
    pub fn render(&self, contracts: &ContractSet) -> Result<GeneratedBindings> {
        let module = BindingModule::from_contracts(&self.config.source, contracts);

        let context = RenderContext {
            source: &module.source,
            table: serde_json::to_string_pretty(&module.table)?,
            contracts: &module.contracts,
            wallet_context: &self.config.bindings.wallet_context,
            dapp_context: &self.config.bindings.dapp_context,
        };

        let bindings = self.templates.render(BINDINGS_TEMPLATE, &context)?;
        let hooks = self.templates.render(HOOKS_TEMPLATE, &context)?;

        Ok(GeneratedBindings {
            module,
            bindings,
            hooks,
        })
    }

    /// Render and write both modules
    pub async fn generate_all(&self, contracts: &ContractSet) -> Result<GeneratedBindings> {
        let generated = self.render(contracts)?;

        info!(
            "Generating bindings for {} contract(s), {} member(s)",
            generated.module.contracts.len(),
            generated.module.member_count()
        );

        if self.config.dry_run {
            info!("Dry run, not writing {}", self.bindings_path().display());
            return Ok(generated);
        }

        self.write_file(&self.bindings_path(), &generated.bindings).await?;
        self.write_file(&self.hooks_path(), &generated.hooks).await?;

        Ok(generated)
    }

    async fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                let err = Error::io(format!("Failed to create directory {}: {}", parent.display(), e));
                error!("{}", err);
                err
            })?;
        }

        tokio::fs::write(path, content).await.map_err(|e| {
            let err = Error::io(format!("Failed to write {}: {}", path.display(), e));
            error!("{}", err);
            err
        })?;

        info!("Wrote {}", path.display());
        Ok(())
    }
}
