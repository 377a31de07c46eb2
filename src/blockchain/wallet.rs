//! Wallet signing capability.
//!
//! The service never holds signing keys. Envelopes are handed to an external
//! signing bridge (a browser wallet relay, a hardware signer) which may take an
//! unbounded amount of time while the user decides.
//!
//! # Security
//! - Secret seeds are never accepted or logged here
//! - Only the envelope blob and the public signer address leave the process

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::blockchain::types::SignedEnvelope;
use crate::config::WalletConfig;
use crate::errors::classifier::USER_REJECTED_CODE;
use crate::errors::RawError;

/// Parameters passed alongside the envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignOptions {
    /// Public account expected to sign.
    pub address: String,
    pub network_passphrase: String,
}

/// Signing failures.
#[derive(Debug, Error)]
pub enum SignError {
    /// The user declined the request.
    #[error("user rejected the signing request")]
    Rejected,

    /// Signer could not be reached.
    #[error("wallet unavailable: {0}")]
    Unavailable(String),

    /// Signer answered but produced no signature.
    #[error("wallet signing failed: {0}")]
    Failed(String),
}

impl From<SignError> for RawError {
    fn from(err: SignError) -> Self {
        match &err {
            SignError::Rejected => RawError::new(err.to_string()).with_code(USER_REJECTED_CODE),
            SignError::Unavailable(_) | SignError::Failed(_) => {
                RawError::new(err.to_string()).with_code("WALLET_ERROR")
            }
        }
    }
}

/// External signer.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// Sign an envelope blob on behalf of `opts.address`.
    async fn sign_transaction(
        &self,
        blob: &str,
        opts: &SignOptions,
    ) -> Result<SignedEnvelope, SignError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignRequest<'a> {
    xdr: &'a str,
    address: &'a str,
    network_passphrase: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignResponse {
    #[serde(default)]
    signed_tx_xdr: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    code: Option<i64>,
}

/// Whether a bridge error describes the user declining the request.
fn is_rejection(error: Option<&str>, code: Option<i64>) -> bool {
    if code == Some(USER_REJECTED_CODE) {
        return true;
    }
    error
        .map(str::to_lowercase)
        .is_some_and(|e| e.contains("reject") || e.contains("denied"))
}

/// Signer reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpWalletBridge {
    http: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpWalletBridge {
    pub fn new(config: &WalletConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: config.bridge_url.clone(),
            timeout: Duration::from_secs(config.sign_timeout_secs),
        }
    }
}

#[async_trait]
impl WalletSigner for HttpWalletBridge {
    async fn sign_transaction(
        &self,
        blob: &str,
        opts: &SignOptions,
    ) -> Result<SignedEnvelope, SignError> {
        let request = SignRequest {
            xdr: blob,
            address: &opts.address,
            network_passphrase: &opts.network_passphrase,
        };

        tracing::debug!(address = %opts.address, url = %self.url, "Requesting signature");

        let response = self
            .http
            .post(&self.url)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| SignError::Unavailable(e.to_string()))?;

        if response.status() == StatusCode::FORBIDDEN {
            return Err(SignError::Rejected);
        }

        let status = response.status();
        let body: SignResponse = response
            .json()
            .await
            .map_err(|e| SignError::Failed(format!("unreadable bridge response: {}", e)))?;

        if is_rejection(body.error.as_deref(), body.code) {
            return Err(SignError::Rejected);
        }
        if let Some(error) = body.error {
            return Err(SignError::Failed(error));
        }
        if !status.is_success() {
            return Err(SignError::Failed(format!("bridge returned {}", status)));
        }

        match body.signed_tx_xdr {
            Some(blob) if !blob.is_empty() => Ok(SignedEnvelope { blob }),
            _ => Err(SignError::Failed("bridge returned no signed envelope".to_string())),
        }
    }
}
