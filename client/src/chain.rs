use std::fmt::{Display, Formatter};

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use scriptlog_common::rpc::OperationStatus;

/// Identifier of an operation submitted through a wallet
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(pub String);

impl OperationId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for OperationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Read access to the chain state the client needs
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Raw datastore value of `key` in `contract`.
    /// `final_value` selects the final value instead of the candidate one.
    async fn datastore_entry(
        &self,
        contract: &str,
        key: &[u8],
        final_value: bool,
    ) -> Result<Option<Vec<u8>>>;

    async fn operation_status(&self, operation: &OperationId) -> Result<OperationStatus>;

    /// Execute `function` without persisting anything and return its raw result
    async fn read_only_call(
        &self,
        contract: &str,
        function: &str,
        args: Vec<u8>,
        caller: Option<&str>,
    ) -> Result<Vec<u8>>;
}
