use std::{sync::Arc, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use log::{debug, trace, warn};
use serde_json::json;
use tokio::sync::mpsc;

use scriptlog_common::rpc::{CallSmartContractParams, GetBalanceParams, WalletAccountInfo};

use crate::{
    chain::OperationId,
    transport::{JsonRpcTransport, TransportConfig},
};

/// Receiver of the new active account address each time it changes
pub type AccountChanges = mpsc::UnboundedReceiver<String>;

/// A state changing contract call to sign and submit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    pub target_address: String,
    pub target_function: String,
    pub parameter: Vec<u8>,
    pub max_gas: u64,
    pub coins: u64,
    pub fee: u64,
}

#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Wallets available to the client, in preference order
    async fn wallets(&self) -> Result<Vec<Arc<dyn Wallet>>>;
}

#[async_trait]
pub trait Wallet: Send + Sync {
    fn name(&self) -> &str;

    /// Ask the wallet for access, false if refused
    async fn connect(&self) -> Result<bool>;

    async fn accounts(&self) -> Result<Vec<Arc<dyn Account>>>;

    /// Stream of active account changes, None if the wallet cannot notify them
    async fn account_changes(&self) -> Result<Option<AccountChanges>> {
        Ok(None)
    }
}

#[async_trait]
pub trait Account: Send + Sync {
    fn address(&self) -> &str;

    /// Decimal balance, final or candidate
    async fn balance(&self, final_balance: bool) -> Result<String>;

    async fn call_contract(&self, call: ContractCall) -> Result<OperationId>;
}

/// Wallet service reached over JSON-RPC.
///
/// The service exposes a single wallet.
pub struct RpcWalletProvider {
    transport: JsonRpcTransport,
    poll_interval: Duration,
}

impl RpcWalletProvider {
    pub fn new(address: &str, config: TransportConfig, poll_interval: Duration) -> Result<Self> {
        Ok(Self {
            transport: JsonRpcTransport::new(address, config)?,
            poll_interval,
        })
    }
}

#[async_trait]
impl WalletProvider for RpcWalletProvider {
    async fn wallets(&self) -> Result<Vec<Arc<dyn Wallet>>> {
        let name: Option<String> = self.transport.call("get_wallet_name", json!([])).await?;
        let Some(name) = name else {
            return Ok(Vec::new());
        };

        debug!("Wallet service at {} exposes wallet '{}'", self.transport.url(), name);
        Ok(vec![Arc::new(RpcWallet {
            name,
            transport: self.transport.clone(),
            poll_interval: self.poll_interval,
        })])
    }
}

pub struct RpcWallet {
    name: String,
    transport: JsonRpcTransport,
    poll_interval: Duration,
}

impl RpcWallet {
    async fn account_infos(transport: &JsonRpcTransport) -> Result<Vec<WalletAccountInfo>> {
        transport.call("get_accounts", json!([])).await
    }
}

#[async_trait]
impl Wallet for RpcWallet {
    fn name(&self) -> &str {
        &self.name
    }

    async fn connect(&self) -> Result<bool> {
        self.transport.call("connect", json!([])).await
    }

    async fn accounts(&self) -> Result<Vec<Arc<dyn Account>>> {
        let infos = Self::account_infos(&self.transport).await?;
        Ok(infos
            .into_iter()
            .map(|info| {
                Arc::new(RpcAccount {
                    address: info.address,
                    transport: self.transport.clone(),
                }) as Arc<dyn Account>
            })
            .collect())
    }

    // The service has no push channel: poll the first account
    // and report each change until the receiver is dropped
    async fn account_changes(&self) -> Result<Option<AccountChanges>> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let transport = self.transport.clone();
        let poll_interval = self.poll_interval;
        let mut current = Self::account_infos(&transport)
            .await?
            .into_iter()
            .next()
            .map(|info| info.address);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(poll_interval);
            loop {
                interval.tick().await;
                if sender.is_closed() {
                    break;
                }

                let first = match Self::account_infos(&transport).await {
                    Ok(infos) => infos.into_iter().next().map(|info| info.address),
                    Err(e) => {
                        warn!("Error while polling wallet accounts: {:#}", e);
                        continue;
                    }
                };

                if let Some(address) = account_change(&mut current, first) {
                    if sender.send(address).is_err() {
                        break;
                    }
                }
            }
        });

        Ok(Some(receiver))
    }
}

// Track the polled first account, returning the new address when it changed.
// A wallet left without account is tracked but not reported.
fn account_change(current: &mut Option<String>, first: Option<String>) -> Option<String> {
    if *current == first {
        return None;
    }

    trace!("Active account changed: {:?} -> {:?}", current, first);
    *current = first;
    current.clone()
}

// Argument buffer is sent hex encoded
fn call_params(address: &str, call: ContractCall) -> CallSmartContractParams {
    CallSmartContractParams {
        address: address.to_owned(),
        target_address: call.target_address,
        target_function: call.target_function,
        parameter: hex::encode(&call.parameter),
        max_gas: call.max_gas,
        coins: call.coins,
        fee: call.fee,
    }
}

pub struct RpcAccount {
    address: String,
    transport: JsonRpcTransport,
}

#[async_trait]
impl Account for RpcAccount {
    fn address(&self) -> &str {
        &self.address
    }

    async fn balance(&self, final_balance: bool) -> Result<String> {
        let params = GetBalanceParams {
            address: self.address.clone(),
            is_final: final_balance,
        };
        self.transport.call("get_balance", params).await
    }

    async fn call_contract(&self, call: ContractCall) -> Result<OperationId> {
        let params = call_params(&self.address, call);
        let id: String = self.transport.call("call_smart_contract", params).await?;
        Ok(OperationId(id))
    }
}
