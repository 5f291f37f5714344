//! Contract deployment
//!
//! Deployment is modelled as an ordered [`DeploymentPlan`] of per-contract
//! tasks. The plan runs its tasks one after another against a
//! [`ContractDeployer`] and records the outcome of each, so the deployment
//! strategy can change without touching what the generator consumes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ethers::abi::Abi;
use ethers::contract::ContractFactory;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, JsonRpcClient, Middleware, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::Bytes;
use ethers::utils::to_checksum;
use serde::{Deserialize, Serialize};
use sol2js_core::config::ChainConfig;
use sol2js_core::{ContractArtifact, ContractSet, Error, Result};
use tracing::{error, info};

/// What the chain reports back for one deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentReceipt {
    /// Checksummed contract address
    pub address: String,
    /// Hash of the creation transaction
    pub transaction_hash: Option<String>,
    /// Block the creation transaction was mined in
    pub block_number: Option<u64>,
}

/// Deploys one compiled contract
#[async_trait]
pub trait ContractDeployer: Send + Sync {
    /// Submit the contract's bytecode and wait for confirmation
    async fn deploy(&self, artifact: &ContractArtifact) -> Result<DeploymentReceipt>;
}

/// [`ContractDeployer`] backed by an ethers middleware stack
#[derive(Debug)]
pub struct EthersDeployer<M> {
    client: Arc<M>,
    confirmations: usize,
    timeout: Option<Duration>,
}

impl<M: Middleware + 'static> EthersDeployer<M> {
    pub fn new(client: Arc<M>, confirmations: usize, timeout: Option<Duration>) -> Self {
        Self {
            client,
            confirmations,
            timeout,
        }
    }

    async fn submit(&self, artifact: &ContractArtifact) -> Result<DeploymentReceipt> {
        let abi: Abi = serde_json::from_value(artifact.raw_abi.clone())
            .map_err(|e| Error::parse(format!("Invalid ABI for {}: {}", artifact.name, e)))?;
        let bytecode = hex::decode(&artifact.bytecode)
            .map(Bytes::from)
            .map_err(|e| Error::parse(format!("Invalid bytecode for {}: {}", artifact.name, e)))?;

        let factory = ContractFactory::new(abi, bytecode, self.client.clone());
        let deployer = factory
            .deploy(())
            .map_err(|e| Error::chain(format!("Failed to build deployment of {}: {}", artifact.name, e)))?
            .confirmations(self.confirmations);

        let (contract, receipt) = deployer
            .send_with_receipt()
            .await
            .map_err(|e| Error::chain(format!("Deployment of {} failed: {}", artifact.name, e)))?;

        Ok(DeploymentReceipt {
            address: to_checksum(&contract.address(), None),
            transaction_hash: Some(format!("{:?}", receipt.transaction_hash)),
            block_number: receipt.block_number.map(|n| n.as_u64()),
        })
    }
}

#[async_trait]
impl<M: Middleware + 'static> ContractDeployer for EthersDeployer<M> {
    async fn deploy(&self, artifact: &ContractArtifact) -> Result<DeploymentReceipt> {
        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.submit(artifact))
                .await
                .unwrap_or_else(|_| {
                    Err(Error::chain(format!(
                        "Deployment of {} not confirmed within {}s",
                        artifact.name,
                        limit.as_secs()
                    )))
                }),
            None => self.submit(artifact).await,
        };

        if let Err(e) = &result {
            error!("{}", e);
        }
        result
    }
}

/// Connect to the configured node and pick the deploying account
pub async fn connect(config: &ChainConfig) -> Result<Box<dyn ContractDeployer>> {
    let provider = Provider::<Http>::try_from(config.rpc_url.as_str())
        .map_err(|e| Error::chain(format!("Failed to create HTTP provider for {}: {}", config.rpc_url, e)))?
        .interval(Duration::from_millis(config.poll_interval_ms));

    connect_with(provider, config).await
}

/// Pick the deploying account on an already constructed provider
pub async fn connect_with<P>(provider: Provider<P>, config: &ChainConfig) -> Result<Box<dyn ContractDeployer>>
where
    P: JsonRpcClient + 'static,
{
    let timeout = config.deploy_timeout_secs.map(Duration::from_secs);

    match &config.private_key {
        Some(key) => {
            let wallet = key
                .trim_start_matches("0x")
                .parse::<LocalWallet>()
                .map_err(|e| Error::config(format!("Invalid private key: {}", e)))?;
            let chain_id = provider
                .get_chainid()
                .await
                .map_err(|e| Error::chain(format!("Failed to read chain id from {}: {}", config.rpc_url, e)))?;
            let wallet = wallet.with_chain_id(chain_id.as_u64());

            info!("Deploying from {} on chain {}", to_checksum(&wallet.address(), None), chain_id);
            let client = SignerMiddleware::new(provider, wallet);
            Ok(Box::new(EthersDeployer::new(Arc::new(client), config.confirmations, timeout)))
        }
        None => {
            let accounts = provider
                .get_accounts()
                .await
                .map_err(|e| Error::chain(format!("Failed to list accounts on {}: {}", config.rpc_url, e)))?;
            let sender = accounts
                .first()
                .copied()
                .ok_or_else(|| Error::chain(format!("Node at {} has no unlocked accounts", config.rpc_url)))?;

            info!("Deploying from unlocked account {}", to_checksum(&sender, None));
            let client = provider.with_sender(sender);
            Ok(Box::new(EthersDeployer::new(Arc::new(client), config.confirmations, timeout)))
        }
    }
}

/// Result of one deployment task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum DeploymentOutcome {
    Deployed(DeploymentReceipt),
    Failed { reason: String },
}

/// One contract to deploy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentTask {
    pub contract: String,
    /// `None` until the task has run
    pub outcome: Option<DeploymentOutcome>,
}

impl DeploymentTask {
    pub fn receipt(&self) -> Option<&DeploymentReceipt> {
        match &self.outcome {
            Some(DeploymentOutcome::Deployed(receipt)) => Some(receipt),
            _ => None,
        }
    }
}

/// Ordered list of deployment tasks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentPlan {
    tasks: Vec<DeploymentTask>,
}

impl DeploymentPlan {
    /// One task per contract tagged deployable, in set order
    pub fn from_contracts(contracts: &ContractSet) -> Self {
        let tasks = contracts
            .deployable()
            .map(|artifact| DeploymentTask {
                contract: artifact.name.clone(),
                outcome: None,
            })
            .collect();
        Self { tasks }
    }

    pub fn tasks(&self) -> &[DeploymentTask] {
        &self.tasks
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Run every pending task in order, stopping at the first failure
    pub async fn execute(&mut self, contracts: &ContractSet, deployer: &dyn ContractDeployer) -> Result<()> {
        let total = self.tasks.len();

        for (index, task) in self.tasks.iter_mut().enumerate() {
            if task.outcome.is_some() {
                continue;
            }

            let artifact = contracts
                .get(&task.contract)
                .ok_or_else(|| Error::validation(format!("Contract {} is not in the compiled set", task.contract)))?;

            info!("Deploying {} ({}/{})", task.contract, index + 1, total);
            match deployer.deploy(artifact).await {
                Ok(receipt) => {
                    info!("{} deployed at {}", task.contract, receipt.address);
                    task.outcome = Some(DeploymentOutcome::Deployed(receipt));
                }
                Err(e) => {
                    task.outcome = Some(DeploymentOutcome::Failed { reason: e.to_string() });
                    return Err(e);
                }
            }
        }

        Ok(())
    }

    /// Copy deployed addresses onto the contracts
    pub fn apply(&self, contracts: &mut ContractSet) {
        for task in &self.tasks {
            if let (Some(receipt), Some(artifact)) = (task.receipt(), contracts.get_mut(&task.contract)) {
                artifact.address = Some(receipt.address.clone());
            }
        }
    }
}
