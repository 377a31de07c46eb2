//! Operation, envelope and RPC types plus transport errors.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::errors::RawError;

/// Default membership attributes.
pub const DEFAULT_TIER: &str = "VIP";
pub const DEFAULT_RARITY: &str = "Legendary";
pub const DEFAULT_CATEGORY: &str = "Membership";

/// Default reason recorded when awarding a badge.
pub const DEFAULT_AWARD_REASON: &str = "Badge awarded for achievement";

/// The closed set of state-changing club operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operation {
    IssueMembership {
        tier: String,
        rarity: String,
        category: String,
    },
    IssueBadge {
        badge_id: String,
        name: String,
        description: String,
    },
    AwardBadge {
        badge_id: String,
        reason: String,
    },
}

impl Operation {
    /// Membership with the club's default attributes.
    pub fn default_membership() -> Self {
        Operation::IssueMembership {
            tier: DEFAULT_TIER.to_string(),
            rarity: DEFAULT_RARITY.to_string(),
            category: DEFAULT_CATEGORY.to_string(),
        }
    }

    /// Contract function invoked by this operation.
    pub fn function_name(&self) -> &'static str {
        match self {
            Operation::IssueMembership { .. } => "issue_membership",
            Operation::IssueBadge { .. } => "issue_badge",
            Operation::AwardBadge { .. } => "award_badge",
        }
    }

    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Operation::IssueMembership { .. } => "membership",
            Operation::IssueBadge { .. } => "badge",
            Operation::AwardBadge { .. } => "award",
        }
    }
}

/// A typed contract-call argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ScArg {
    Address(String),
    String(String),
}

/// Unsigned contract invocation. Encoded as base64 JSON for transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionEnvelope {
    pub source: String,
    pub contract_id: String,
    pub function: String,
    pub args: Vec<ScArg>,
    pub fee: u32,
    pub network_passphrase: String,
    /// Latest acceptance time, seconds since the epoch.
    pub max_time: u64,
}

impl TransactionEnvelope {
    /// Opaque blob handed to the wallet and the network.
    pub fn to_blob(&self) -> Result<String, serde_json::Error> {
        Ok(STANDARD.encode(serde_json::to_vec(self)?))
    }

    pub fn from_blob(blob: &str) -> Result<Self, EnvelopeError> {
        let bytes = STANDARD.decode(blob)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Envelope blob could not be decoded.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("envelope is not base64: {0}")]
    Encoding(#[from] base64::DecodeError),
    #[error("envelope body is malformed: {0}")]
    Body(#[from] serde_json::Error),
}

/// Network-scoped hash of an envelope blob, hex encoded.
pub fn envelope_hash(network_passphrase: &str, blob: &str) -> String {
    let network_id = Sha256::digest(network_passphrase.as_bytes());
    let mut hasher = Sha256::new();
    hasher.update(network_id);
    hasher.update(blob.as_bytes());
    hex::encode(hasher.finalize())
}

/// Output of the build step.
#[derive(Debug, Clone)]
pub struct BuiltTransaction {
    pub envelope: TransactionEnvelope,
    pub blob: String,
    pub hash: String,
}

/// Blob returned by the wallet after signing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedEnvelope {
    pub blob: String,
}

/// Result of handing a signed envelope to the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmitStatus {
    /// Accepted, waiting to be included in a ledger.
    Pending,
    /// Already known to the network; treated like pending.
    Duplicate,
    /// Network asked for a later resubmission.
    TryAgainLater,
    /// Rejected at submission.
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitResponse {
    pub status: SubmitStatus,
    /// Handle for status polling.
    pub hash: String,
    pub error_result: Option<String>,
}

/// Transaction confirmation status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationStatus {
    /// Not yet resolved by the network.
    Pending,
    /// Included in a ledger.
    Confirmed { ledger: Option<u64> },
    /// Rejected by the network.
    Failed(String),
}

/// Errors talking HTTP / JSON-RPC to an external endpoint.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("network request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request timeout after {0} ms")]
    Timeout(u64),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("network returned an unexpected response: {0}")]
    Decode(String),
}

impl From<TransportError> for RawError {
    fn from(err: TransportError) -> Self {
        match &err {
            TransportError::Http(e) if e.is_timeout() => {
                RawError::new(err.to_string()).with_code("TIMEOUT")
            }
            TransportError::Http(_) | TransportError::Decode(_) => {
                RawError::new(err.to_string()).with_code("NETWORK_ERROR")
            }
            TransportError::Timeout(_) => RawError::new(err.to_string()).with_code("TIMEOUT"),
            TransportError::Rpc { code, .. } => RawError::new(err.to_string()).with_code(*code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{classify_kind, ErrorKind};

    fn envelope() -> TransactionEnvelope {
        TransactionEnvelope {
            source: format!("G{}", "A".repeat(55)),
            contract_id: format!("C{}", "B".repeat(55)),
            function: "issue_membership".to_string(),
            args: vec![
                ScArg::Address(format!("G{}", "C".repeat(55))),
                ScArg::String("VIP".to_string()),
            ],
            fee: 100,
            network_passphrase: "Test SDF Network ; September 2015".to_string(),
            max_time: 1_700_000_030,
        }
    }

    #[test]
    fn test_blob_decodes_back() {
        let env = envelope();
        let blob = env.to_blob().unwrap();
        assert_eq!(TransactionEnvelope::from_blob(&blob).unwrap(), env);
        assert!(TransactionEnvelope::from_blob("%%%").is_err());
    }

    #[test]
    fn test_hash_is_network_scoped() {
        let blob = envelope().to_blob().unwrap();
        let testnet = envelope_hash("Test SDF Network ; September 2015", &blob);
        let mainnet = envelope_hash("Public Global Stellar Network ; September 2015", &blob);
        assert_eq!(testnet.len(), 64);
        assert_ne!(testnet, mainnet);
        assert_eq!(testnet, envelope_hash("Test SDF Network ; September 2015", &blob));
    }

    #[test]
    fn test_operation_names() {
        assert_eq!(Operation::default_membership().function_name(), "issue_membership");
        let award = Operation::AwardBadge {
            badge_id: "b1".into(),
            reason: DEFAULT_AWARD_REASON.into(),
        };
        assert_eq!(award.label(), "award");
    }

    #[test]
    fn test_transport_errors_classify() {
        let timeout: RawError = TransportError::Timeout(10_000).into();
        assert_eq!(classify_kind(&timeout), ErrorKind::TimeoutError);

        let decode: RawError = TransportError::Decode("missing result".into()).into();
        assert_eq!(classify_kind(&decode), ErrorKind::NetworkError);
    }
}
