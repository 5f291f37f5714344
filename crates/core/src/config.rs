//! Configuration for compilation, deployment and binding generation

use std::env;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "SOL2JS";

/// Native compiler settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Compiler executable, looked up on PATH when not absolute
    pub solc_path: String,

    /// Pass `--optimize` to the compiler
    pub optimize: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            solc_path: "solc".to_string(),
            optimize: false,
        }
    }
}

/// Chain endpoint and deployment settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// JSON-RPC endpoint of the node
    pub rpc_url: String,

    /// Hex private key of the deployer; the node's first account is used when unset
    pub private_key: Option<String>,

    /// Blocks to wait for after the deployment transaction is mined
    pub confirmations: usize,

    /// Receipt polling interval in milliseconds
    pub poll_interval_ms: u64,

    /// Give up on a single deployment after this many seconds
    pub deploy_timeout_secs: Option<u64>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            private_key: None,
            confirmations: 1,
            poll_interval_ms: 100,
            deploy_timeout_secs: None,
        }
    }
}

/// A context provider imported by the generated hooks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextImport {
    /// Exported identifier of the context
    pub name: String,
    /// Module path, relative to the hooks file
    pub path: String,
}

impl ContextImport {
    pub fn new<N: Into<String>, P: Into<String>>(name: N, path: P) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// Generated bindings settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BindingsConfig {
    /// Subdirectory of the output directory receiving the hooks module
    pub hooks_dir: String,

    /// Context exposing the connected wallet
    pub wallet_context: ContextImport,

    /// Context exposing the bound contract instances
    pub dapp_context: ContextImport,
}

impl Default for BindingsConfig {
    fn default() -> Self {
        Self {
            hooks_dir: "hooks".to_string(),
            wallet_context: ContextImport::new("WalletContext", "../contexts/WalletContext"),
            dapp_context: ContextImport::new("DappContext", "../contexts/DappContext"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Output format (pretty, json)
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Sol2JsConfig {
    pub compiler: CompilerConfig,
    pub chain: ChainConfig,
    pub bindings: BindingsConfig,
    pub logging: LogConfig,
}

/// Configuration validation error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation error in field '{}': {}", self.field, self.message)
    }
}

/// Configuration validation result
pub type ValidationResult = std::result::Result<(), Vec<ValidationError>>;

/// Configuration validator trait
pub trait ConfigValidator {
    /// Validate the configuration
    fn validate(&self) -> ValidationResult;
}

fn collect(errors: Vec<ValidationError>) -> ValidationResult {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

impl ConfigValidator for CompilerConfig {
    fn validate(&self) -> ValidationResult {
        let mut errors = Vec::new();

        if self.solc_path.trim().is_empty() {
            errors.push(ValidationError::new("compiler.solc_path", "Compiler path cannot be empty"));
        }

        collect(errors)
    }
}

impl ConfigValidator for ChainConfig {
    fn validate(&self) -> ValidationResult {
        let mut errors = Vec::new();

        if self.rpc_url.is_empty() {
            errors.push(ValidationError::new("chain.rpc_url", "RPC URL cannot be empty"));
        } else if !self.rpc_url.starts_with("http://") && !self.rpc_url.starts_with("https://") {
            errors.push(ValidationError::new(
                "chain.rpc_url",
                format!("RPC URL '{}' must use http:// or https://", self.rpc_url),
            ));
        }

        if let Some(key) = &self.private_key {
            let digits = key.strip_prefix("0x").unwrap_or(key);
            if digits.len() != 64 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
                errors.push(ValidationError::new(
                    "chain.private_key",
                    "Private key must be 32 bytes of hex",
                ));
            }
        }

        if self.poll_interval_ms == 0 {
            errors.push(ValidationError::new(
                "chain.poll_interval_ms",
                "Polling interval must be greater than 0",
            ));
        }

        if self.deploy_timeout_secs == Some(0) {
            errors.push(ValidationError::new(
                "chain.deploy_timeout_secs",
                "Deploy timeout must be greater than 0 when set",
            ));
        }

        collect(errors)
    }
}

impl ConfigValidator for BindingsConfig {
    fn validate(&self) -> ValidationResult {
        let mut errors = Vec::new();

        for (field, context) in [
            ("bindings.wallet_context", &self.wallet_context),
            ("bindings.dapp_context", &self.dapp_context),
        ] {
            if context.name.is_empty() {
                errors.push(ValidationError::new(format!("{}.name", field), "Context name cannot be empty"));
            }
            if context.path.is_empty() {
                errors.push(ValidationError::new(format!("{}.path", field), "Context path cannot be empty"));
            }
        }

        if !self.wallet_context.name.is_empty() && self.wallet_context.name == self.dapp_context.name {
            errors.push(ValidationError::new(
                "bindings",
                "Wallet and dapp contexts must have different names",
            ));
        }

        if self.hooks_dir.is_empty() {
            errors.push(ValidationError::new("bindings.hooks_dir", "Hooks directory cannot be empty"));
        } else if Path::new(&self.hooks_dir).is_absolute() {
            errors.push(ValidationError::new(
                "bindings.hooks_dir",
                "Hooks directory must be relative to the output directory",
            ));
        }

        collect(errors)
    }
}

impl ConfigValidator for LogConfig {
    fn validate(&self) -> ValidationResult {
        let mut errors = Vec::new();

        match self.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => errors.push(ValidationError::new(
                "logging.level",
                format!("Invalid log level '{}'. Supported levels: trace, debug, info, warn, error", other),
            )),
        }

        match self.format.as_str() {
            "pretty" | "json" => {}
            other => errors.push(ValidationError::new(
                "logging.format",
                format!("Invalid log format '{}'. Supported formats: pretty, json", other),
            )),
        }

        collect(errors)
    }
}

impl ConfigValidator for Sol2JsConfig {
    fn validate(&self) -> ValidationResult {
        let mut errors = Vec::new();

        for result in [
            self.compiler.validate(),
            self.chain.validate(),
            self.bindings.validate(),
            self.logging.validate(),
        ] {
            if let Err(mut section) = result {
                errors.append(&mut section);
            }
        }

        collect(errors)
    }
}

impl Sol2JsConfig {
    /// Load configuration from a TOML, JSON or YAML file, then apply environment overrides
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read configuration file {}: {}", path.display(), e)))?;

        let mut config: Self = match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => toml::from_str(&content)
                .map_err(|e| Error::config(format!("Failed to parse TOML configuration file {}: {}", path.display(), e)))?,
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| Error::config(format!("Failed to parse JSON configuration file {}: {}", path.display(), e)))?,
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
                .map_err(|e| Error::config(format!("Failed to parse YAML configuration file {}: {}", path.display(), e)))?,
            _ => return Err(unsupported_format()),
        };

        config.apply_environment_overrides()?;
        tracing::debug!("Loaded configuration from {}", path.display());

        Ok(config)
    }

    /// Load from `path` when given, defaults otherwise; overrides and validation apply to both
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => {
                let mut config = Self::default();
                config.apply_environment_overrides()?;
                config
            }
        };

        config.ensure_valid()?;
        Ok(config)
    }

    /// Validate every section, joining the errors into one `Error::Config`
    pub fn ensure_valid(&self) -> Result<()> {
        self.validate().map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            Error::config(messages.join("; "))
        })
    }

    /// Apply `SOL2JS_*` environment variables
    pub fn apply_environment_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| env::var(key).ok())
    }

    /// Apply overrides read through `lookup`
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}_{}", ENV_PREFIX, name));

        if let Some(solc) = var("SOLC") {
            self.compiler.solc_path = solc;
        }
        if let Some(rpc_url) = var("RPC_URL") {
            self.chain.rpc_url = rpc_url;
        }
        if let Some(private_key) = var("PRIVATE_KEY") {
            self.chain.private_key = Some(private_key);
        }
        if let Some(confirmations) = var("CONFIRMATIONS") {
            self.chain.confirmations = confirmations
                .parse()
                .map_err(|_| Error::config(format!("Invalid {}_CONFIRMATIONS: {}", ENV_PREFIX, confirmations)))?;
        }
        if let Some(level) = var("LOG_LEVEL") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Save configuration in the format implied by the file extension
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        let content = match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => toml::to_string_pretty(self)
                .map_err(|e| Error::config(format!("Failed to serialize configuration to TOML: {}", e)))?,
            Some("json") => serde_json::to_string_pretty(self)
                .map_err(|e| Error::config(format!("Failed to serialize configuration to JSON: {}", e)))?,
            Some("yaml") | Some("yml") => serde_yaml::to_string(self)
                .map_err(|e| Error::config(format!("Failed to serialize configuration to YAML: {}", e)))?,
            _ => return Err(unsupported_format()),
        };

        fs::write(path, content)
            .map_err(|e| Error::io(format!("Failed to write configuration file {}: {}", path.display(), e)))?;

        Ok(())
    }
}

fn unsupported_format() -> Error {
    Error::config("Unsupported configuration file format. Supported formats: .toml, .json, .yaml, .yml")
}
