use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use log::{debug, trace};
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use url::Url;

use scriptlog_common::rpc::{Id, JsonRpcRequest, JsonRpcResponse};

/// Timeouts applied to every JSON-RPC request
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub request_timeout: Duration,
    pub connection_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            connection_timeout: Duration::from_secs(10),
        }
    }
}

/// Parse an endpoint, assuming http:// when no scheme is given
pub fn parse_endpoint(address: &str) -> Result<Url> {
    let url = if address.starts_with("http://") || address.starts_with("https://") {
        Url::parse(address)?
    } else {
        Url::parse(&format!("http://{}", address))?
    };
    Ok(url)
}

/// JSON-RPC 2.0 over HTTP POST, one request per call, never retried
#[derive(Clone)]
pub struct JsonRpcTransport {
    client: Client,
    url: Url,
    config: TransportConfig,
}

impl JsonRpcTransport {
    pub fn new(address: &str, config: TransportConfig) -> Result<Self> {
        let url = parse_endpoint(address)
            .with_context(|| format!("Invalid JSON-RPC endpoint '{}'", address))?;

        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connection_timeout)
            .build()?;

        Ok(Self {
            client,
            url,
            config,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub async fn call<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> Result<R> {
        let params = serde_json::to_value(params)?;
        let value = self.request(method, params).await?;
        serde_json::from_value(value)
            .with_context(|| format!("Invalid result for method '{}'", method))
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let request = JsonRpcRequest::new(Id::Number(rand::random::<u32>() as u64), method, params);
        debug!("Making JSON-RPC request to {}: {}", self.url, method);

        let response = self
            .client
            .post(self.url.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    anyhow!("Request timeout after {:?}", self.config.request_timeout)
                } else if e.is_connect() {
                    anyhow!("Connection failed: {}", e)
                } else {
                    anyhow!("Network error: {}", e)
                }
            })?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error {}: {}",
                response.status().as_u16(),
                response.status().canonical_reason().unwrap_or("Unknown error")
            ));
        }

        let rpc_response: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse JSON response: {}", e))?;

        if log::log_enabled!(log::Level::Trace) {
            trace!("Response of {}: {:?}", method, rpc_response.result);
        }

        rpc_response.into_result().map_err(|e| {
            if e.is_protocol_error() {
                anyhow!("Node rejected '{}' request: {}", method, e)
            } else {
                anyhow!(e)
            }
        })
    }
}
