use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::Display;

use super::{JsonRpcError, JSON_RPC_VERSION};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    Number(u64),
    String(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: Id,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

impl JsonRpcRequest {
    pub fn new<S: Into<String>>(id: Id, method: S, params: Value) -> Self {
        Self {
            jsonrpc: JSON_RPC_VERSION.to_owned(),
            id,
            method: method.into(),
            params,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Option<Id>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    // Extract the result, turning an error object into an error
    pub fn into_result(self) -> Result<Value, JsonRpcError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        // A null result is a valid answer
        Ok(self.result.unwrap_or(Value::Null))
    }
}

// Node API

/// One key to read from a contract datastore
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatastoreEntryInput {
    pub address: String,
    pub key: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatastoreEntryOutput {
    pub final_value: Option<Vec<u8>>,
    pub candidate_value: Option<Vec<u8>>,
}

impl DatastoreEntryOutput {
    /// Final value when `final` is set, otherwise the candidate (speculative) one
    pub fn value(self, r#final: bool) -> Option<Vec<u8>> {
        if r#final {
            self.final_value
        } else {
            self.candidate_value
        }
    }
}

/// Operation as reported by `get_operations`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationInfo {
    pub id: String,
    #[serde(default)]
    pub in_pool: bool,
    #[serde(default)]
    pub is_operation_final: bool,
    #[serde(default)]
    pub op_exec_status: Option<bool>,
}

impl OperationInfo {
    pub fn status(&self) -> OperationStatus {
        match (self.op_exec_status, self.is_operation_final) {
            (None, _) => OperationStatus::PendingInclusion,
            (Some(true), false) => OperationStatus::SpeculativeSuccess,
            (Some(false), false) => OperationStatus::SpeculativeError,
            (Some(true), true) => OperationStatus::FinalSuccess,
            (Some(false), true) => OperationStatus::FinalError,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum OperationStatus {
    NotFound,
    PendingInclusion,
    SpeculativeSuccess,
    SpeculativeError,
    FinalSuccess,
    FinalError,
}

impl OperationStatus {
    // No further transition will happen
    pub fn is_final(&self) -> bool {
        matches!(self, Self::FinalSuccess | Self::FinalError)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::SpeculativeError | Self::FinalError)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadOnlyCallInput {
    pub target_address: String,
    pub target_function: String,
    pub parameter: Vec<u8>,
    pub max_gas: u64,
    #[serde(default)]
    pub caller_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadOnlyResult {
    Ok(Vec<u8>),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadOnlyCallOutput {
    pub result: ReadOnlyResult,
}

// Wallet API

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletAccountInfo {
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetBalanceParams {
    pub address: String,
    #[serde(rename = "final")]
    pub is_final: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSmartContractParams {
    pub address: String,
    pub target_address: String,
    pub target_function: String,
    // Hex encoded argument buffer
    pub parameter: String,
    pub max_gas: u64,
    pub coins: u64,
    pub fee: u64,
}
