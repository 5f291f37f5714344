//! End-to-end pipeline tests against a stand-in compiler script

#![cfg(unix)]

use std::collections::BTreeMap;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use sol2js_core::{ContractArtifact, Error, Result, Sol2JsConfig};
use sol2js_ethereum::deployer::{ContractDeployer, DeploymentOutcome, DeploymentReceipt};
use sol2js_ethereum::{compile, compile_with, generate_from_artifact, CompileOptions, CompilePipeline};
use tempfile::TempDir;

/// Writing and spawning scripts concurrently can fail with ETXTBSY
static SCRIPT_LOCK: Mutex<()> = Mutex::new(());

const COMBINED_JSON: &str = r#"{
  "contracts": {
    "contracts/Deployable.sol:Deployable": {
      "abi": [{"inputs":[],"name":"deployable","outputs":[{"internalType":"bool","name":"","type":"bool"}],"stateMutability":"view","type":"function"}],
      "bin": ""
    },
    "contracts/Storage.sol:MathLib": {
      "abi": [{"inputs":[{"internalType":"uint256","name":"a","type":"uint256"}],"name":"double","outputs":[{"internalType":"uint256","name":"","type":"uint256"}],"stateMutability":"pure","type":"function"}],
      "bin": "60806040"
    },
    "contracts/Storage.sol:SimpleStorage": {
      "abi": [
        {"inputs":[],"stateMutability":"nonpayable","type":"constructor"},
        {"anonymous":false,"inputs":[{"indexed":false,"internalType":"uint256","name":"value","type":"uint256"}],"name":"ValueChanged","type":"event"},
        {"inputs":[],"name":"deployable","outputs":[{"internalType":"bool","name":"","type":"bool"}],"stateMutability":"view","type":"function"},
        {"inputs":[{"internalType":"uint256","name":"value","type":"uint256"}],"name":"setValue","outputs":[],"stateMutability":"payable","type":"function"}
      ],
      "bin": "6080604052348015600f57600080fd5b50"
    }
  },
  "version": "0.8.21+commit.d9974bed.Linux.g++"
}"#;

/// Records deployments and hands out sequential addresses
#[derive(Default)]
struct RecordingDeployer {
    deployed: Mutex<Vec<String>>,
    fail: bool,
}

#[async_trait]
impl ContractDeployer for RecordingDeployer {
    async fn deploy(&self, artifact: &ContractArtifact) -> Result<DeploymentReceipt> {
        if self.fail {
            return Err(Error::chain("connection refused"));
        }
        let mut deployed = self.deployed.lock().unwrap();
        deployed.push(artifact.name.clone());
        Ok(DeploymentReceipt {
            address: "0x5FbDB2315678afecb367f032d93F642f64180aa3".to_string(),
            transaction_hash: Some(format!("0x{:064x}", deployed.len())),
            block_number: Some(1),
        })
    }
}

/// Write an executable standing in for `solc`
fn write_script(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("solc");
    fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn fake_solc(dir: &Path) -> PathBuf {
    let fixture = dir.join("combined.fixture.json");
    fs::write(&fixture, COMBINED_JSON).unwrap();

    write_script(
        dir,
        &format!(
            r#"if [ "$1" = "--version" ]; then
  echo "solc, the solidity compiler commandline interface"
  echo "Version: 0.8.21+commit.d9974bed.Linux.g++"
  exit 0
fi
out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "-o" ]; then out="$2"; shift; fi
  shift
done
cp "{}" "$out/combined.json"
echo "Compiler run successful. Artifact(s) can be found in directory $out." >&2
"#,
            fixture.display()
        ),
    )
}

fn config_with(solc: &Path) -> Sol2JsConfig {
    let mut config = Sol2JsConfig::default();
    config.compiler.solc_path = solc.display().to_string();
    config
}

fn source_file(dir: &Path) -> PathBuf {
    let source = dir.join("Storage.sol");
    fs::write(&source, "// SPDX-License-Identifier: MIT\npragma solidity ^0.8.0;\n").unwrap();
    source
}

#[tokio::test]
async fn test_compile_deploy_and_generate() {
    let _guard = SCRIPT_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let dir = TempDir::new().unwrap();
    let config = config_with(&fake_solc(dir.path()));
    let source = source_file(dir.path());
    let out_dir = dir.path().join("output");
    let deployer = RecordingDeployer::default();

    let output = CompilePipeline::new(&config)
        .with_deployer(&deployer)
        .run(&source, &out_dir)
        .await
        .unwrap();

    // Marker interface and unmarked contracts are filtered out
    assert_eq!(output.contracts.names(), vec!["SimpleStorage"]);
    assert_eq!(*deployer.deployed.lock().unwrap(), vec!["SimpleStorage"]);
    assert_eq!(
        output.contracts.get("SimpleStorage").unwrap().address.as_deref(),
        Some("0x5FbDB2315678afecb367f032d93F642f64180aa3")
    );
    assert!(matches!(
        output.plan.tasks()[0].outcome,
        Some(DeploymentOutcome::Deployed(_))
    ));

    // combined.json is renamed after the source
    assert_eq!(output.artifact_path, out_dir.join("Storage.json"));
    assert!(output.artifact_path.exists());
    assert!(!out_dir.join("combined.json").exists());

    let bindings = fs::read_to_string(out_dir.join("Storage.js")).unwrap();
    assert!(bindings.contains("export class SimpleStorage {"));
    assert_eq!(bindings.matches("async ").count(), 2);
    assert!(bindings.contains("async deployable() {"));
    assert!(bindings.contains("async setValue(uint256_value, overrides) {"));
    assert!(bindings.contains("\"address\": \"0x5FbDB2315678afecb367f032d93F642f64180aa3\""));
    assert!(!bindings.contains("MathLib"));

    let hooks = fs::read_to_string(out_dir.join("hooks").join("Storage.js")).unwrap();
    assert_eq!(hooks.matches("export const use").count(), 2);
    assert!(hooks.contains("export const useSimpleStorageDeployable = () => {"));
    assert!(hooks.contains("export const useSimpleStorageSetValue = (uint256_value, overrides) => {"));
    assert_eq!(output.hooks_path, out_dir.join("hooks").join("Storage.js"));
}

#[tokio::test]
async fn test_generation_without_deployment_is_idempotent() {
    let _guard = SCRIPT_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let dir = TempDir::new().unwrap();
    let config = config_with(&fake_solc(dir.path()));
    let source = source_file(dir.path());
    let out_dir = dir.path().join("output");

    let first = CompilePipeline::new(&config).run(&source, &out_dir).await.unwrap();
    assert!(first.contracts.get("SimpleStorage").unwrap().address.is_none());
    let bindings = fs::read_to_string(&first.bindings_path).unwrap();
    let hooks = fs::read_to_string(&first.hooks_path).unwrap();

    let second = CompilePipeline::new(&config).run(&source, &out_dir).await.unwrap();
    assert_eq!(fs::read_to_string(&second.bindings_path).unwrap(), bindings);
    assert_eq!(fs::read_to_string(&second.hooks_path).unwrap(), hooks);
}

#[tokio::test]
async fn test_generate_from_existing_artifact() {
    let dir = TempDir::new().unwrap();
    let artifact = dir.path().join("Storage.json");
    fs::write(&artifact, COMBINED_JSON).unwrap();
    let out_dir = dir.path().join("web");

    let mut addresses = BTreeMap::new();
    addresses.insert("SimpleStorage".to_string(), "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512".to_string());
    addresses.insert("MathLib".to_string(), "0x0000000000000000000000000000000000000001".to_string());

    let contracts = generate_from_artifact(&artifact, &out_dir, &addresses, &Sol2JsConfig::default(), false)
        .await
        .unwrap();

    assert_eq!(contracts.names(), vec!["SimpleStorage"]);
    let bindings = fs::read_to_string(out_dir.join("Storage.js")).unwrap();
    assert!(bindings.contains("0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512"));
    assert!(out_dir.join("hooks").join("Storage.js").exists());
}

#[tokio::test]
async fn test_compiler_failure_aborts_run() {
    let _guard = SCRIPT_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let dir = TempDir::new().unwrap();
    let solc = write_script(
        dir.path(),
        r#"if [ "$1" = "--version" ]; then echo "Version: 0.8.21"; exit 0; fi
echo "Error: Expected ';' but got '}'" >&2
exit 1
"#,
    );
    let config = config_with(&solc);
    let source = source_file(dir.path());
    let out_dir = dir.path().join("output");
    let deployer = RecordingDeployer::default();

    let err = CompilePipeline::new(&config)
        .with_deployer(&deployer)
        .run(&source, &out_dir)
        .await
        .unwrap_err();

    match err {
        Error::Compiler { stderr, .. } => assert!(stderr.contains("Expected ';'")),
        other => panic!("unexpected error: {other}"),
    }
    assert!(deployer.deployed.lock().unwrap().is_empty());
    assert!(!out_dir.join("Storage.js").exists());
}

#[tokio::test]
async fn test_deployment_failure_aborts_before_generation() {
    let _guard = SCRIPT_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let dir = TempDir::new().unwrap();
    let config = config_with(&fake_solc(dir.path()));
    let source = source_file(dir.path());
    let out_dir = dir.path().join("output");
    let deployer = RecordingDeployer {
        fail: true,
        ..Default::default()
    };

    let err = CompilePipeline::new(&config)
        .with_deployer(&deployer)
        .run(&source, &out_dir)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Chain(_)));
    assert!(out_dir.join("Storage.json").exists());
    assert!(!out_dir.join("Storage.js").exists());
}

#[tokio::test]
async fn test_missing_compiler() {
    let dir = TempDir::new().unwrap();
    let config = config_with(&dir.path().join("no-such-solc"));
    let source = source_file(dir.path());

    let err = CompilePipeline::new(&config)
        .run(&source, dir.path())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::MissingToolchain(_)));
}

#[tokio::test]
async fn test_dry_run_writes_no_bindings() {
    let _guard = SCRIPT_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let dir = TempDir::new().unwrap();
    let config = config_with(&fake_solc(dir.path()));
    let source = source_file(dir.path());
    let out_dir = dir.path().join("output");

    let options = CompileOptions {
        deploy: false,
        dry_run: true,
    };
    let contracts = compile_with(&source, &out_dir, &config, options).await.unwrap();

    assert_eq!(contracts.names(), vec!["SimpleStorage"]);
    assert!(out_dir.join("Storage.json").exists());
    assert!(!out_dir.join("Storage.js").exists());
    assert!(!out_dir.join("hooks").exists());
}

#[tokio::test]
async fn test_generate_dry_run_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let artifact = dir.path().join("Storage.json");
    fs::write(&artifact, COMBINED_JSON).unwrap();
    let out_dir = dir.path().join("web");

    let contracts = generate_from_artifact(&artifact, &out_dir, &BTreeMap::new(), &Sol2JsConfig::default(), true)
        .await
        .unwrap();

    assert_eq!(contracts.len(), 1);
    assert!(!out_dir.exists());
}

#[tokio::test]
async fn test_compile_fails_when_node_is_unreachable() {
    let dir = TempDir::new().unwrap();
    let mut config = config_with(&dir.path().join("no-such-solc"));
    config.chain.rpc_url = "http://127.0.0.1:1".to_string();
    let source = source_file(dir.path());

    let err = compile(&source, dir.path(), &config).await.unwrap_err();
    assert!(matches!(err, Error::Chain(_)));
}
