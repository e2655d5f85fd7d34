use std::{sync::Arc, time::Duration};

use futures::{stream, StreamExt};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::{sync::Mutex, time::sleep};

use scriptlog_common::{
    config::{
        script_key, DEFAULT_CONTRACT_ADDRESS, DEFAULT_FINALIZATION_TIMEOUT_SECS,
        DEFAULT_POLL_INTERVAL_MS, SAVE_SCRIPT_FEE, SAVE_SCRIPT_MAX_GAS, SCRIPT_ID_KEY,
    },
    contract::{save_script_args, EntryPoint},
};

use crate::{
    chain::{ChainReader, OperationId},
    wallet::{Account, ContractCall, Wallet, WalletProvider},
};

// Entry reads in flight at once while listing
pub const MAX_CONCURRENT_READS: usize = 16;

// Messages exposed in the client state
pub const FETCH_FAILED: &str = "Failed to fetch scripts.";
pub const SAVE_FAILED: &str = "Failed to save script.";
pub const CONNECT_FAILED: &str = "Error connecting to wallet";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Wallet is not connected")]
    NotConnected,
    #[error("Script is empty")]
    EmptyScript,
    #[error("No wallets found")]
    NoWallets,
    #[error("Failed to connect to wallet")]
    WalletRefused,
    #[error("No accounts found in wallet")]
    NoAccounts,
    #[error("Operation {0} was not finalized in time")]
    FinalizationTimeout(OperationId),
    #[error("Operation {0} failed")]
    OperationFailed(OperationId),
    #[error("Invalid script ID in datastore: '{0}'")]
    InvalidCounter(String),
    #[error(transparent)]
    Rpc(#[from] anyhow::Error),
}

impl ClientError {
    // Message shown to the user when connecting failed
    fn connect_message(&self) -> String {
        match self {
            Self::NoWallets | Self::WalletRefused | Self::NoAccounts => self.to_string(),
            _ => CONNECT_FAILED.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSettings {
    pub contract_address: String,
    // Read final datastore values instead of candidate ones
    pub final_reads: bool,
    pub finalization_timeout: Duration,
    pub poll_interval: Duration,
    pub max_gas: u64,
    pub fee: u64,
    pub coins: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            contract_address: DEFAULT_CONTRACT_ADDRESS.to_owned(),
            final_reads: false,
            finalization_timeout: Duration::from_secs(DEFAULT_FINALIZATION_TIMEOUT_SECS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            max_gas: SAVE_SCRIPT_MAX_GAS,
            fee: SAVE_SCRIPT_FEE,
            coins: 0,
        }
    }
}

/// Observable state of the client
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientState {
    pub address: Option<String>,
    pub scripts: Vec<String>,
    pub error: Option<String>,
    pub loading: bool,
    pub saving: bool,
    // Entries dropped by the last listing
    pub skipped_reads: usize,
}

struct Connection {
    wallet: Arc<dyn Wallet>,
    account: Arc<dyn Account>,
}

/// Reads and writes the script log of one contract.
///
/// Holds no copy of the log besides the last listing: every
/// operation starts from a fresh counter read.
pub struct ScriptClient<R: ChainReader, W: WalletProvider> {
    reader: Arc<R>,
    provider: Arc<W>,
    settings: ClientSettings,
    connection: Mutex<Option<Connection>>,
    state: Mutex<ClientState>,
}

impl<R: ChainReader, W: WalletProvider> ScriptClient<R, W> {
    pub fn new(reader: Arc<R>, provider: Arc<W>, settings: ClientSettings) -> Self {
        Self {
            reader,
            provider,
            settings,
            connection: Mutex::new(None),
            state: Mutex::new(ClientState::default()),
        }
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    pub async fn state(&self) -> ClientState {
        self.state.lock().await.clone()
    }

    pub async fn is_connected(&self) -> bool {
        self.connection.lock().await.is_some()
    }

    /// Connect the first wallet and select its first account.
    /// The listing is refreshed when the address changed.
    pub async fn connect(&self) -> Result<String, ClientError> {
        self.state.lock().await.error = None;

        let connection = match self.open_connection().await {
            Ok(connection) => connection,
            Err(e) => {
                warn!("Error while connecting to wallet: {}", e);
                self.state.lock().await.error = Some(e.connect_message());
                return Err(e);
            }
        };

        let address = connection.account.address().to_owned();
        *self.connection.lock().await = Some(connection);

        let changed = {
            let mut state = self.state.lock().await;
            let changed = state.address.as_deref() != Some(address.as_str());
            state.address = Some(address.clone());
            changed
        };

        info!("Connected with account {}", address);
        if changed {
            // a listing failure is already reported in the state
            let _ = self.fetch_all().await;
        }

        Ok(address)
    }

    async fn open_connection(&self) -> Result<Connection, ClientError> {
        let wallet = self
            .provider
            .wallets()
            .await?
            .into_iter()
            .next()
            .ok_or(ClientError::NoWallets)?;

        debug!("Using wallet {}", wallet.name());
        if !wallet.connect().await? {
            return Err(ClientError::WalletRefused);
        }

        let account = wallet
            .accounts()
            .await?
            .into_iter()
            .next()
            .ok_or(ClientError::NoAccounts)?;

        self.log_balance(account.as_ref()).await;
        Ok(Connection { wallet, account })
    }

    async fn log_balance(&self, account: &dyn Account) {
        match account.balance(false).await {
            Ok(balance) => info!("Account {} balance: {}", account.address(), balance),
            Err(e) => warn!("Error while fetching balance of {}: {:#}", account.address(), e),
        }
    }

    /// Counter of the log, 0 when the contract has none yet
    pub async fn next_script_id(&self) -> Result<u64, ClientError> {
        let value = self
            .reader
            .datastore_entry(
                &self.settings.contract_address,
                SCRIPT_ID_KEY.as_bytes(),
                self.settings.final_reads,
            )
            .await?;

        let Some(bytes) = value else {
            debug!("No script ID in datastore");
            return Ok(0);
        };

        let text = String::from_utf8_lossy(&bytes);
        text.trim()
            .parse::<u64>()
            .map_err(|_| ClientError::InvalidCounter(text.into_owned()))
    }

    /// List every stored script in index order.
    ///
    /// Entries that fail to load, are absent or are not valid UTF-8
    /// are left out and counted in [`ClientState::skipped_reads`].
    /// An empty script is listed as is.
    pub async fn fetch_all(&self) -> Result<Vec<String>, ClientError> {
        {
            let mut state = self.state.lock().await;
            state.loading = true;
            state.error = None;
        }

        let result = self.read_all().await;

        let mut state = self.state.lock().await;
        state.loading = false;
        match result {
            Ok((scripts, skipped)) => {
                state.scripts = scripts.clone();
                state.skipped_reads = skipped;
                Ok(scripts)
            }
            Err(e) => {
                warn!("Error while fetching scripts: {}", e);
                state.scripts.clear();
                state.skipped_reads = 0;
                state.error = Some(FETCH_FAILED.to_owned());
                Err(e)
            }
        }
    }

    async fn read_all(&self) -> Result<(Vec<String>, usize), ClientError> {
        let counter = self.next_script_id().await?;
        if counter == 0 {
            return Ok((Vec::new(), 0));
        }

        let contract = self.settings.contract_address.as_str();
        let final_reads = self.settings.final_reads;
        let reads = (0..counter).map(|id| async move {
            let key = script_key(id);
            (
                id,
                self.reader
                    .datastore_entry(contract, key.as_bytes(), final_reads)
                    .await,
            )
        });

        let mut reads = stream::iter(reads).buffered(MAX_CONCURRENT_READS);
        let mut scripts = Vec::new();
        let mut skipped = 0;
        while let Some((id, result)) = reads.next().await {
            match result {
                Ok(Some(bytes)) => match String::from_utf8(bytes) {
                    Ok(script) => scripts.push(script),
                    Err(_) => {
                        warn!("Script {} is not valid UTF-8", id);
                        skipped += 1;
                    }
                },
                Ok(None) => {
                    debug!("No script found for ID {}", id);
                    skipped += 1;
                }
                Err(e) => {
                    warn!("Error while reading script {}: {:#}", id, e);
                    skipped += 1;
                }
            }
        }

        if skipped > 0 && log::log_enabled!(log::Level::Warn) {
            warn!("{} of {} scripts could not be read", skipped, counter);
        }
        Ok((scripts, skipped))
    }

    /// Save `text` at the next index, wait for finalization then refresh the listing
    pub async fn append_next(&self, text: &str) -> Result<OperationId, ClientError> {
        let account = self
            .connection
            .lock()
            .await
            .as_ref()
            .map(|connection| connection.account.clone())
            .ok_or(ClientError::NotConnected)?;

        let text = text.trim();
        if text.is_empty() {
            return Err(ClientError::EmptyScript);
        }

        {
            let mut state = self.state.lock().await;
            state.saving = true;
            state.error = None;
        }

        let result = self.submit(account.as_ref(), text).await;

        {
            let mut state = self.state.lock().await;
            state.saving = false;
            if let Err(e) = &result {
                warn!("Error while saving script: {}", e);
                state.error = Some(SAVE_FAILED.to_owned());
            }
        }

        let operation = result?;
        // a listing failure is already reported in the state
        let _ = self.fetch_all().await;
        Ok(operation)
    }

    async fn submit(&self, account: &dyn Account, text: &str) -> Result<OperationId, ClientError> {
        let index = self.next_script_id().await?;
        debug!("Saving script with ID {}", index);
        self.log_balance(account).await;

        let function: &'static str = EntryPoint::SaveScript.into();
        let call = ContractCall {
            target_address: self.settings.contract_address.clone(),
            target_function: function.to_owned(),
            parameter: save_script_args(index, text),
            max_gas: self.settings.max_gas,
            coins: self.settings.coins,
            fee: self.settings.fee,
        };

        let operation = account.call_contract(call).await?;
        info!("Script {} submitted in operation {}", index, operation);

        self.wait_final_execution(&operation).await?;
        info!("Operation {} finalized", operation);
        Ok(operation)
    }

    async fn wait_final_execution(&self, operation: &OperationId) -> Result<(), ClientError> {
        tokio::time::timeout(
            self.settings.finalization_timeout,
            self.poll_final_execution(operation),
        )
        .await
        .map_err(|_| ClientError::FinalizationTimeout(operation.clone()))?
    }

    async fn poll_final_execution(&self, operation: &OperationId) -> Result<(), ClientError> {
        loop {
            let status = self.reader.operation_status(operation).await?;
            match status {
                status if status.is_error() => {
                    return Err(ClientError::OperationFailed(operation.clone()))
                }
                status if status.is_final() => return Ok(()),
                _ => {
                    if log::log_enabled!(log::Level::Debug) {
                        debug!("Operation {} is {}, waiting", operation, status);
                    }
                }
            }
            sleep(self.settings.poll_interval).await;
        }
    }

    /// Read-only call of an exposed contract function
    pub async fn read_exposed(&self, function: &str, args: Vec<u8>) -> Result<Vec<u8>, ClientError> {
        let caller = self.state.lock().await.address.clone();
        let data = self
            .reader
            .read_only_call(
                &self.settings.contract_address,
                function,
                args,
                caller.as_deref(),
            )
            .await?;
        Ok(data)
    }

    /// Follow the active account of the connected wallet until the
    /// wallet stops notifying. Returns the number of changes applied.
    pub async fn watch_account_changes(&self) -> Result<usize, ClientError> {
        let wallet = self
            .connection
            .lock()
            .await
            .as_ref()
            .map(|connection| connection.wallet.clone())
            .ok_or(ClientError::NotConnected)?;

        let Some(mut changes) = wallet.account_changes().await? else {
            debug!("Wallet {} does not notify account changes", wallet.name());
            return Ok(0);
        };

        let mut applied = 0;
        while let Some(address) = changes.recv().await {
            self.apply_account_change(wallet.as_ref(), address).await;
            applied += 1;
        }
        Ok(applied)
    }

    async fn apply_account_change(&self, wallet: &dyn Wallet, address: String) {
        info!("Account changed to {}", address);

        match wallet.accounts().await {
            Ok(accounts) => {
                if let Some(account) = accounts.into_iter().find(|a| a.address() == address) {
                    if let Some(connection) = self.connection.lock().await.as_mut() {
                        connection.account = account;
                    }
                } else {
                    warn!("Account {} is not listed by wallet {}", address, wallet.name());
                }
            }
            Err(e) => warn!("Error while listing wallet accounts: {:#}", e),
        }

        let changed = {
            let mut state = self.state.lock().await;
            let changed = state.address.as_deref() != Some(address.as_str());
            state.address = Some(address);
            changed
        };

        if changed {
            let _ = self.fetch_all().await;
        }
    }
}
