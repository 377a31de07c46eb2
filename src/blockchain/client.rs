//! Soroban JSON-RPC client with timeout and error handling.
//!
//! # Responsibilities
//! - Submit signed envelopes (`sendTransaction`)
//! - Poll transaction resolution (`getTransaction`)
//! - Report endpoint health (`getHealth`)
//! - Map transport failures into classifiable errors

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::blockchain::types::{
    ConfirmationStatus, SignedEnvelope, SubmitResponse, SubmitStatus, TransportError,
};
use crate::config::NetworkConfig;
use crate::errors::RawError;

/// Network capability used by the orchestrator.
#[async_trait]
pub trait NetworkRpc: Send + Sync {
    /// Send a signed envelope; returns the tracking handle.
    async fn submit(&self, signed: &SignedEnvelope) -> Result<SubmitResponse, RawError>;

    /// Current resolution of a previously submitted transaction.
    async fn get_status(&self, hash: &str) -> Result<ConfirmationStatus, RawError>;
}

#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    result: Option<Value>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendTransactionResult {
    status: String,
    hash: String,
    #[serde(default)]
    error_result_xdr: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GetTransactionResult {
    status: String,
    #[serde(default)]
    ledger: Option<u64>,
    #[serde(default, rename = "resultXdr")]
    result_xdr: Option<String>,
}

/// JSON-RPC client for a Soroban endpoint.
#[derive(Clone)]
pub struct SorobanRpcClient {
    http: reqwest::Client,
    rpc_url: String,
    timeout_duration: Duration,
    next_id: Arc<AtomicU64>,
}

impl SorobanRpcClient {
    /// Create a new client for the configured RPC endpoint.
    pub fn new(config: &NetworkConfig) -> Self {
        Self::with_url(&config.rpc_url, Duration::from_millis(config.connection_timeout_ms))
    }

    pub fn with_url(rpc_url: &str, timeout_duration: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            rpc_url: rpc_url.to_string(),
            timeout_duration,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Issue one JSON-RPC call and return its `result` member.
    async fn call(&self, method: &str, params: Value) -> Result<Value, TransportError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let fut = async {
            let response = self
                .http
                .post(&self.rpc_url)
                .json(&body)
                .send()
                .await?
                .error_for_status()?;
            response.json::<RpcEnvelope>().await
        };

        let envelope = match timeout(self.timeout_duration, fut).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(method = method, "RPC timeout");
                return Err(TransportError::Timeout(self.timeout_duration.as_millis() as u64));
            }
        };

        if let Some(err) = envelope.error {
            tracing::warn!(method = method, code = err.code, error = %err.message, "RPC error");
            return Err(TransportError::Rpc {
                code: err.code,
                message: err.message,
            });
        }

        envelope
            .result
            .ok_or_else(|| TransportError::Decode(format!("{} response has no result", method)))
    }

    /// Check if the RPC endpoint reports itself healthy.
    pub async fn get_health(&self) -> Result<bool, TransportError> {
        let result = self.call("getHealth", json!({})).await?;
        Ok(result.get("status").and_then(Value::as_str) == Some("healthy"))
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }
}

fn decode<T: for<'de> Deserialize<'de>>(method: &str, value: Value) -> Result<T, TransportError> {
    serde_json::from_value(value).map_err(|e| TransportError::Decode(format!("{}: {}", method, e)))
}

#[async_trait]
impl NetworkRpc for SorobanRpcClient {
    async fn submit(&self, signed: &SignedEnvelope) -> Result<SubmitResponse, RawError> {
        let value = self
            .call("sendTransaction", json!({ "transaction": signed.blob }))
            .await?;
        let result: SendTransactionResult = decode("sendTransaction", value)?;

        let status = match result.status.as_str() {
            "PENDING" => SubmitStatus::Pending,
            "DUPLICATE" => SubmitStatus::Duplicate,
            "TRY_AGAIN_LATER" => SubmitStatus::TryAgainLater,
            _ => SubmitStatus::Error,
        };
        tracing::debug!(hash = %result.hash, status = ?status, "Transaction submitted");

        Ok(SubmitResponse {
            status,
            hash: result.hash,
            error_result: result.error_result_xdr,
        })
    }

    async fn get_status(&self, hash: &str) -> Result<ConfirmationStatus, RawError> {
        let value = self.call("getTransaction", json!({ "hash": hash })).await?;
        let result: GetTransactionResult = decode("getTransaction", value)?;

        Ok(match result.status.as_str() {
            "SUCCESS" => ConfirmationStatus::Confirmed {
                ledger: result.ledger,
            },
            "FAILED" => ConfirmationStatus::Failed(
                result
                    .result_xdr
                    .unwrap_or_else(|| "transaction rejected by ledger".to_string()),
            ),
            _ => ConfirmationStatus::Pending,
        })
    }
}

impl std::fmt::Debug for SorobanRpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SorobanRpcClient")
            .field("rpc_url", &self.rpc_url)
            .field("timeout", &self.timeout_duration)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        // Nothing listens on port 9 of localhost.
        let client = SorobanRpcClient::with_url("http://127.0.0.1:9", Duration::from_secs(2));
        let err = client
            .get_status("abc")
            .await
            .unwrap_err();
        assert!(err.message.starts_with("network request failed") || err.message.contains("timeout"));
    }

    #[test]
    fn test_decode_send_result() {
        let value = json!({"status": "ERROR", "hash": "ff", "errorResultXdr": "AAAA"});
        let result: SendTransactionResult = decode("sendTransaction", value).unwrap();
        assert_eq!(result.status, "ERROR");
        assert_eq!(result.error_result_xdr.as_deref(), Some("AAAA"));

        let missing = decode::<SendTransactionResult>("sendTransaction", json!({"status": "PENDING"}));
        assert!(matches!(missing, Err(TransportError::Decode(_))));
    }
}
