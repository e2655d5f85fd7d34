use thiserror::Error;

use crate::serializer::ReaderError;

/// Errors raised by the host storage backend
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Errors raised by the append-only script log
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScriptLogError {
    /// The counter was never set by the constructor
    #[error("Script ID not set")]
    NotInitialized,

    /// Only the current counter value is accepted as a write index
    #[error("Script ID {index} is not consecutive to {next}")]
    NonConsecutiveIndex { index: u64, next: u64 },

    /// No script was stored at this index
    #[error("Script not found: {0}")]
    NotFound(u64),

    /// Initialization attempted outside of the deployment call
    #[error("Constructor can only be called during deployment")]
    NotDeploying,

    /// Counter value in storage is not a decimal u64
    #[error("Stored script ID is corrupted: '{0}'")]
    CorruptedCounter(String),

    /// Stored script is not valid UTF-8
    #[error("Stored script {0} is not valid UTF-8")]
    CorruptedEntry(u64),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors raised while executing a contract entry point
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ContractError {
    #[error("Unknown entry point '{0}'")]
    UnknownEntryPoint(String),

    #[error("{0}")]
    InvalidArgument(&'static str),

    #[error(transparent)]
    Log(#[from] ScriptLogError),

    #[error("Contract is not deployed")]
    NotDeployed,

    #[error("Contract is already deployed")]
    AlreadyDeployed,

    #[error("Invalid return data: {0}")]
    InvalidReturnData(ReaderError),
}
