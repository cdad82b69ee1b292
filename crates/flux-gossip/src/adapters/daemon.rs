//! Node registry backed by the coin daemon's `listzelnodes` RPC.
//!
//! The daemon speaks JSON-RPC 1.0 over HTTP with basic auth.

use crate::domain::NodeRecord;
use crate::ports::{NodeRegistry, RegistryError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// JSON-RPC request structure.
#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Vec<Value>,
}

/// JSON-RPC response structure.
#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

/// JSON-RPC error structure.
#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// Daemon connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonRpcConfig {
    /// `http://host:port` of the daemon RPC
    pub url: String,
    /// RPC user
    pub user: String,
    /// RPC password
    pub password: String,
    /// Request timeout
    pub timeout: Duration,
}

/// Registry client for the coin daemon.
pub struct DaemonNodeRegistry {
    http_client: reqwest::Client,
    config: DaemonRpcConfig,
    request_id: AtomicU64,
}

impl DaemonNodeRegistry {
    /// Create a new client.
    pub fn new(config: DaemonRpcConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http_client,
            config,
            request_id: AtomicU64::new(1),
        }
    }

    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, RegistryError> {
        let request = JsonRpcRequest {
            jsonrpc: "1.0",
            id: self.request_id.fetch_add(1, Ordering::SeqCst),
            method,
            params,
        };

        let response = self
            .http_client
            .post(&self.config.url)
            .basic_auth(&self.config.user, Some(&self.config.password))
            .json(&request)
            .send()
            .await
            .map_err(|e| RegistryError::Unreachable(e.to_string()))?;

        let rpc_response: JsonRpcResponse<Value> = response
            .json()
            .await
            .map_err(|e| RegistryError::InvalidResponse(e.to_string()))?;

        if let Some(error) = rpc_response.error {
            return Err(RegistryError::InvalidResponse(format!(
                "RPC error {}: {}",
                error.code, error.message
            )));
        }

        rpc_response
            .result
            .ok_or_else(|| RegistryError::InvalidResponse("missing result".into()))
    }
}

/// Parse a `listzelnodes` result.
fn parse_node_list(result: Value) -> Result<Vec<NodeRecord>, RegistryError> {
    serde_json::from_value(result).map_err(|e| RegistryError::InvalidResponse(e.to_string()))
}

#[async_trait]
impl NodeRegistry for DaemonNodeRegistry {
    async fn list_nodes(&self, filter: Option<&str>) -> Result<Vec<NodeRecord>, RegistryError> {
        let params = match filter {
            Some(key) => vec![Value::String(key.to_string())],
            None => Vec::new(),
        };
        parse_node_list(self.call("listzelnodes", params).await?)
    }
}
