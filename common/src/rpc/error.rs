use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Error object returned by a JSON-RPC server
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("RPC error {code}: {message}")]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    // Codes reserved by the JSON-RPC specification
    pub fn is_protocol_error(&self) -> bool {
        (-32768..=-32000).contains(&self.code)
    }
}
