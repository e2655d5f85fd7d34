use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::debug;
use serde_json::{json, Value};

use scriptlog_common::{
    config::READ_ONLY_MAX_GAS,
    rpc::{
        DatastoreEntryInput, DatastoreEntryOutput, OperationInfo, OperationStatus,
        ReadOnlyCallInput, ReadOnlyCallOutput, ReadOnlyResult,
    },
};

use crate::{
    chain::{ChainReader, OperationId},
    transport::{JsonRpcTransport, TransportConfig},
};

// Every node method takes its inputs as one positional list
fn datastore_entries_params(entries: &[DatastoreEntryInput]) -> Value {
    json!([entries])
}

fn operations_params(ids: &[OperationId]) -> Value {
    json!([ids])
}

fn read_only_call_params(input: &ReadOnlyCallInput) -> Value {
    json!([[input]])
}

/// Client of the node JSON-RPC API
pub struct DaemonClient {
    transport: JsonRpcTransport,
}

impl DaemonClient {
    pub fn new(daemon_address: &str) -> Result<Self> {
        Self::with_config(daemon_address, TransportConfig::default())
    }

    pub fn with_config(daemon_address: &str, config: TransportConfig) -> Result<Self> {
        Ok(Self {
            transport: JsonRpcTransport::new(daemon_address, config)?,
        })
    }

    pub async fn get_datastore_entries(
        &self,
        entries: Vec<DatastoreEntryInput>,
    ) -> Result<Vec<DatastoreEntryOutput>> {
        let expected = entries.len();
        let outputs: Vec<DatastoreEntryOutput> = self
            .transport
            .call("get_datastore_entries", datastore_entries_params(&entries))
            .await?;

        if outputs.len() != expected {
            return Err(anyhow!(
                "Expected {} datastore entries, got {}",
                expected,
                outputs.len()
            ));
        }
        Ok(outputs)
    }

    pub async fn get_operations(&self, ids: &[OperationId]) -> Result<Vec<OperationInfo>> {
        self.transport
            .call("get_operations", operations_params(ids))
            .await
    }

    pub async fn execute_read_only_call(
        &self,
        input: ReadOnlyCallInput,
    ) -> Result<ReadOnlyCallOutput> {
        let mut outputs: Vec<ReadOnlyCallOutput> = self
            .transport
            .call("execute_read_only_call", read_only_call_params(&input))
            .await?;

        outputs
            .pop()
            .ok_or_else(|| anyhow!("No result in read only call response"))
    }
}

#[async_trait]
impl ChainReader for DaemonClient {
    async fn datastore_entry(
        &self,
        contract: &str,
        key: &[u8],
        final_value: bool,
    ) -> Result<Option<Vec<u8>>> {
        let input = DatastoreEntryInput {
            address: contract.to_owned(),
            key: key.to_vec(),
        };

        let mut outputs = self.get_datastore_entries(vec![input]).await?;
        Ok(outputs.pop().and_then(|output| output.value(final_value)))
    }

    async fn operation_status(&self, operation: &OperationId) -> Result<OperationStatus> {
        let infos = self.get_operations(std::slice::from_ref(operation)).await?;
        let status = infos
            .iter()
            .find(|info| info.id == operation.as_str())
            .map(OperationInfo::status)
            .unwrap_or(OperationStatus::NotFound);

        debug!("Operation {} status: {}", operation, status);
        Ok(status)
    }

    async fn read_only_call(
        &self,
        contract: &str,
        function: &str,
        args: Vec<u8>,
        caller: Option<&str>,
    ) -> Result<Vec<u8>> {
        let input = ReadOnlyCallInput {
            target_address: contract.to_owned(),
            target_function: function.to_owned(),
            parameter: args,
            max_gas: READ_ONLY_MAX_GAS,
            caller_address: caller.map(str::to_owned),
        };

        match self.execute_read_only_call(input).await?.result {
            ReadOnlyResult::Ok(data) => Ok(data),
            ReadOnlyResult::Error(message) => Err(anyhow!("Read only call failed: {}", message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_datastore_entries_params() {
        let entries = vec![DatastoreEntryInput {
            address: "AS1contract".to_owned(),
            key: b"ab".to_vec(),
        }];
        assert_eq!(
            datastore_entries_params(&entries),
            json!([[{"address": "AS1contract", "key": [97, 98]}]])
        );
    }

    #[test]
    fn test_operations_params() {
        let ids = vec![OperationId("op_1".to_owned())];
        assert_eq!(operations_params(&ids), json!([["op_1"]]));
    }

    #[test]
    fn test_read_only_call_params() {
        let input = ReadOnlyCallInput {
            target_address: "AS1contract".to_owned(),
            target_function: "get_script_id".to_owned(),
            parameter: Vec::new(),
            max_gas: READ_ONLY_MAX_GAS,
            caller_address: None,
        };
        assert_eq!(
            read_only_call_params(&input),
            json!([[{
                "target_address": "AS1contract",
                "target_function": "get_script_id",
                "parameter": [],
                "max_gas": READ_ONLY_MAX_GAS,
                "caller_address": null
            }]])
        );
    }

    #[tokio::test]
    async fn test_unreachable_node() {
        let config = TransportConfig {
            request_timeout: Duration::from_secs(2),
            connection_timeout: Duration::from_secs(1),
        };
        let client = DaemonClient::with_config("127.0.0.1:9", config).unwrap();
        assert!(client.get_operations(&[]).await.is_err());
    }
}
