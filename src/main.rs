/// sol2js main entry point
use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use sol2js_core::config::LogConfig;
use sol2js_core::Sol2JsConfig;
use sol2js_ethereum::{compile_with, generate_from_artifact, CompileOptions};

#[derive(Parser)]
#[command(name = "sol2js")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file path (toml, json or yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a Solidity file, deploy its contracts and generate bindings
    Compile {
        /// Solidity source file
        source: PathBuf,

        /// Output directory for the artifact and generated modules
        #[arg(default_value = "./")]
        out_dir: PathBuf,

        /// Ethereum RPC URL
        #[arg(long)]
        rpc_url: Option<String>,

        /// Generate bindings without deploying
        #[arg(long)]
        no_deploy: bool,

        /// Render bindings without writing them
        #[arg(long)]
        dry_run: bool,
    },

    /// Regenerate bindings from an existing compiler artifact
    Generate {
        /// Combined JSON produced by a previous compile
        combined_json: PathBuf,

        /// Output directory for the generated modules
        #[arg(default_value = "./")]
        out_dir: PathBuf,

        /// Deployed address of a contract, as Name=0x...
        #[arg(long = "address", value_parser = parse_address)]
        addresses: Vec<(String, String)>,

        /// Render bindings without writing them
        #[arg(long)]
        dry_run: bool,
    },

    /// Write a default configuration file
    InitConfig {
        /// Destination path; the extension selects the format
        path: PathBuf,
    },
}

fn parse_address(value: &str) -> std::result::Result<(String, String), String> {
    let (name, address) = value
        .split_once('=')
        .ok_or_else(|| format!("expected Name=0x..., got '{}'", value))?;

    if name.is_empty() || address.is_empty() {
        return Err(format!("expected Name=0x..., got '{}'", value));
    }

    Ok((name.to_string(), address.to_string()))
}

/// Command-line chain settings take precedence over the file and are validated with it
fn apply_rpc_override(config: &mut Sol2JsConfig, rpc_url: Option<String>) -> sol2js_core::Result<()> {
    if let Some(rpc_url) = rpc_url {
        config.chain.rpc_url = rpc_url;
        config.ensure_valid()?;
    }
    Ok(())
}

fn init_tracing(logging: &LogConfig, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level))
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Sol2JsConfig::load(cli.config.as_deref())?;
    init_tracing(&config.logging, cli.verbose);

    match cli.command {
        Commands::Compile {
            source,
            out_dir,
            rpc_url,
            no_deploy,
            dry_run,
        } => {
            apply_rpc_override(&mut config, rpc_url)?;

            let options = CompileOptions {
                deploy: !no_deploy,
                dry_run,
            };
            let contracts = compile_with(&source, &out_dir, &config, options).await?;

            for artifact in contracts.iter() {
                match &artifact.address {
                    Some(address) => info!("{} deployed at {}", artifact.name, address),
                    None => info!("{} bound without an address", artifact.name),
                }
            }
        }

        Commands::Generate {
            combined_json,
            out_dir,
            addresses,
            dry_run,
        } => {
            let addresses: BTreeMap<String, String> = addresses.into_iter().collect();
            let contracts = generate_from_artifact(&combined_json, &out_dir, &addresses, &config, dry_run).await?;
            info!("Generated bindings for {} contract(s)", contracts.len());
        }

        Commands::InitConfig { path } => {
            if path.exists() {
                return Err(anyhow!("Refusing to overwrite {}", path.display()));
            }
            Sol2JsConfig::default().save_to_file(&path)?;
            info!("Wrote default configuration to {}", path.display());
        }
    }

    Ok(())
}
