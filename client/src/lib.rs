//! Script Log client library
//!
//! Connects a wallet, lists the scripts stored by the contract and saves new ones.

pub mod chain;
pub mod config;
pub mod daemon_client;
pub mod local;
pub mod script_client;
pub mod transport;
pub mod wallet;

pub use chain::{ChainReader, OperationId};
pub use config::{ConfigValidationError, ConfigValidator, Network, ValidatedConfig};
pub use daemon_client::DaemonClient;
pub use local::LocalNode;
pub use script_client::{ClientError, ClientSettings, ClientState, ScriptClient};
pub use wallet::{Account, ContractCall, RpcWalletProvider, Wallet, WalletProvider};
