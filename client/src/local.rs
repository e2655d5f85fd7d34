//! In-process node and wallet running the script log contract on a
//! [`ContractHost`]. Every operation is executed and finalized as soon
//! as it is submitted.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use indexmap::IndexMap;
use log::{debug, info};
use tokio::sync::{mpsc, Mutex};

use scriptlog_common::{
    contract::{AppendPolicy, ContractHost, MemoryStorage, PublishedEvent},
    rpc::{OperationInfo, OperationStatus},
};

use crate::{
    chain::{ChainReader, OperationId},
    wallet::{Account, AccountChanges, ContractCall, Wallet, WalletProvider},
};

pub const LOCAL_WALLET_NAME: &str = "local";

struct NodeState {
    host: ContractHost<MemoryStorage>,
    operations: IndexMap<OperationId, OperationInfo>,
    accounts: Vec<String>,
    wallet_available: bool,
    connection_allowed: bool,
    listeners: Vec<mpsc::UnboundedSender<String>>,
}

#[derive(Clone)]
pub struct LocalNode {
    contract_address: Arc<str>,
    state: Arc<Mutex<NodeState>>,
}

impl LocalNode {
    /// Deploy a fresh contract at `contract_address`
    pub fn new(contract_address: &str, accounts: Vec<String>) -> Result<Self> {
        Self::with_policy(contract_address, accounts, AppendPolicy::default())
    }

    pub fn with_policy(
        contract_address: &str,
        accounts: Vec<String>,
        policy: AppendPolicy,
    ) -> Result<Self> {
        let mut host = ContractHost::with_policy(MemoryStorage::new(), policy);
        host.deploy(&[])?;
        info!("Local node deployed contract {}", contract_address);

        Ok(Self {
            contract_address: Arc::from(contract_address),
            state: Arc::new(Mutex::new(NodeState {
                host,
                operations: IndexMap::new(),
                accounts,
                wallet_available: true,
                connection_allowed: true,
                listeners: Vec::new(),
            })),
        })
    }

    pub fn contract_address(&self) -> &str {
        &self.contract_address
    }

    pub async fn set_wallet_available(&self, available: bool) {
        self.state.lock().await.wallet_available = available;
    }

    pub async fn set_connection_allowed(&self, allowed: bool) {
        self.state.lock().await.connection_allowed = allowed;
    }

    /// Make `address` the active account and notify listeners
    pub async fn switch_account(&self, address: &str) {
        let mut state = self.state.lock().await;
        state.accounts.retain(|a| a != address);
        state.accounts.insert(0, address.to_owned());
        state
            .listeners
            .retain(|listener| listener.send(address.to_owned()).is_ok());
    }

    pub async fn listener_count(&self) -> usize {
        self.state.lock().await.listeners.len()
    }

    // Ends every account change stream
    pub async fn close_account_changes(&self) {
        self.state.lock().await.listeners.clear();
    }

    pub async fn events(&self) -> Vec<PublishedEvent> {
        self.state.lock().await.host.events().to_vec()
    }

    /// Run `function` as a submitted operation.
    /// A reverted call is still recorded, with a failed status.
    pub async fn submit(&self, call: ContractCall) -> Result<OperationId> {
        let mut state = self.state.lock().await;
        if call.target_address != *self.contract_address {
            return Err(anyhow!("Unknown contract {}", call.target_address));
        }

        let id = OperationId(format!("op_{}", state.operations.len()));
        let success = match state.host.call(&call.target_function, &call.parameter) {
            Ok(_) => true,
            Err(e) => {
                debug!("Operation {} reverted: {}", id, e);
                false
            }
        };

        state.operations.insert(
            id.clone(),
            OperationInfo {
                id: id.0.clone(),
                in_pool: false,
                is_operation_final: true,
                op_exec_status: Some(success),
            },
        );
        Ok(id)
    }
}

#[async_trait]
impl ChainReader for LocalNode {
    async fn datastore_entry(
        &self,
        contract: &str,
        key: &[u8],
        _final_value: bool,
    ) -> Result<Option<Vec<u8>>> {
        if contract != &*self.contract_address {
            return Ok(None);
        }
        Ok(self.state.lock().await.host.datastore_entry(key)?)
    }

    async fn operation_status(&self, operation: &OperationId) -> Result<OperationStatus> {
        Ok(self
            .state
            .lock()
            .await
            .operations
            .get(operation)
            .map(OperationInfo::status)
            .unwrap_or(OperationStatus::NotFound))
    }

    async fn read_only_call(
        &self,
        contract: &str,
        function: &str,
        args: Vec<u8>,
        _caller: Option<&str>,
    ) -> Result<Vec<u8>> {
        if contract != &*self.contract_address {
            return Err(anyhow!("Unknown contract {}", contract));
        }

        let result = self.state.lock().await.host.read_only_call(function, &args)?;
        Ok(result.return_data)
    }
}

#[async_trait]
impl WalletProvider for LocalNode {
    async fn wallets(&self) -> Result<Vec<Arc<dyn Wallet>>> {
        if !self.state.lock().await.wallet_available {
            return Ok(Vec::new());
        }
        Ok(vec![Arc::new(self.clone())])
    }
}

#[async_trait]
impl Wallet for LocalNode {
    fn name(&self) -> &str {
        LOCAL_WALLET_NAME
    }

    async fn connect(&self) -> Result<bool> {
        Ok(self.state.lock().await.connection_allowed)
    }

    async fn accounts(&self) -> Result<Vec<Arc<dyn Account>>> {
        let state = self.state.lock().await;
        Ok(state
            .accounts
            .iter()
            .map(|address| {
                Arc::new(LocalAccount {
                    address: address.clone(),
                    node: self.clone(),
                }) as Arc<dyn Account>
            })
            .collect())
    }

    async fn account_changes(&self) -> Result<Option<AccountChanges>> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.state.lock().await.listeners.push(sender);
        Ok(Some(receiver))
    }
}

pub struct LocalAccount {
    address: String,
    node: LocalNode,
}

#[async_trait]
impl Account for LocalAccount {
    fn address(&self) -> &str {
        &self.address
    }

    async fn balance(&self, _final_balance: bool) -> Result<String> {
        Ok("0".to_owned())
    }

    async fn call_contract(&self, call: ContractCall) -> Result<OperationId> {
        self.node.submit(call).await
    }
}
