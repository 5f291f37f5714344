//! Native `solc` invocation

use std::path::{Path, PathBuf};
use std::process::Stdio;

use sol2js_core::config::CompilerConfig;
use sol2js_core::{Error, Result};
use tokio::process::Command;
use tracing::{debug, error, info, warn};

/// File name `solc --combined-json` writes into the output directory
pub const COMBINED_JSON: &str = "combined.json";

const INSTALL_HINT: &str = "Visit https://docs.soliditylang.org/en/latest/installing-solidity.html \
and install a binary package or the Docker image, not the npm package";

/// Runs the Solidity compiler as a subprocess
#[derive(Debug, Clone)]
pub struct SolcCompiler {
    config: CompilerConfig,
}

impl SolcCompiler {
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    /// Path of the compiler executable
    pub fn program(&self) -> &str {
        &self.config.solc_path
    }

    /// Check that the compiler can be started, returning its version banner
    pub async fn ensure_installed(&self) -> Result<String> {
        let output = Command::new(self.program())
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                let err = Error::missing_toolchain(format!(
                    "{} solidity compiler is not installed ({}). {}",
                    self.program(),
                    e,
                    INSTALL_HINT
                ));
                error!("{}", err);
                err
            })?;

        if !output.status.success() {
            let err = Error::missing_toolchain(format!(
                "{} --version exited with {}. {}",
                self.program(),
                output.status,
                INSTALL_HINT
            ));
            error!("{}", err);
            return Err(err);
        }

        let banner = String::from_utf8_lossy(&output.stdout);
        let version = banner
            .lines()
            .find(|line| line.starts_with("Version:"))
            .unwrap_or_else(|| banner.trim())
            .trim()
            .to_string();
        debug!("Found {}: {}", self.program(), version);

        Ok(version)
    }

    /// Arguments requesting combined ABI and bytecode output into `out_dir`
    pub fn arguments(&self, source: &Path, out_dir: &Path) -> Vec<String> {
        let mut args = vec![
            "--combined-json".to_string(),
            "abi,bin".to_string(),
        ];
        if self.config.optimize {
            args.push("--optimize".to_string());
        }
        args.extend([
            source.display().to_string(),
            "--overwrite".to_string(),
            "-o".to_string(),
            out_dir.display().to_string(),
        ]);
        args
    }

    /// Compile `source` and rename the combined output to `<stem>.json`
    pub async fn compile(&self, source: &Path, out_dir: &Path) -> Result<PathBuf> {
        tokio::fs::create_dir_all(out_dir).await.map_err(|e| {
            let err = Error::io(format!("Failed to create output directory {}: {}", out_dir.display(), e));
            error!("{}", err);
            err
        })?;

        let output = Command::new(self.program())
            .args(self.arguments(source, out_dir))
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                let err = Error::missing_toolchain(format!("Failed to start {}: {}", self.program(), e));
                error!("{}", err);
                err
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            error!("{}", stderr.trim());
            return Err(Error::compiler(output.status.to_string(), stderr.trim()));
        }

        if !stdout.trim().is_empty() {
            debug!("{}", stdout.trim());
        }
        if !stderr.trim().is_empty() {
            warn!("{}", stderr.trim());
        }
        info!("Compilation of {} succeeded", source.display());

        let combined = out_dir.join(COMBINED_JSON);
        let renamed = out_dir.join(artifact_file_name(source)?);
        tokio::fs::rename(&combined, &renamed).await.map_err(|e| {
            let err = Error::io(format!(
                "Failed to rename {} to {}: {}",
                combined.display(),
                renamed.display(),
                e
            ));
            error!("{}", err);
            err
        })?;

        Ok(renamed)
    }
}

/// Stem of the source file, used to name every generated file
pub fn source_stem(source: &Path) -> Result<String> {
    source
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .ok_or_else(|| Error::validation(format!("Invalid source file name: {}", source.display())))
}

/// `<stem>.json`
pub fn artifact_file_name(source: &Path) -> Result<String> {
    Ok(format!("{}.json", source_stem(source)?))
}
