//! Envelope building and confirmation monitoring.
//!
//! # Responsibilities
//! - Validate operation inputs before anything leaves the process
//! - Build the unsigned contract invocation for each operation kind
//! - Poll the network until a submitted transaction resolves

use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::time::sleep;

use crate::blockchain::address::{is_valid_account_id, is_valid_contract_id, sanitize_input, validate_metadata};
use crate::blockchain::client::NetworkRpc;
use crate::blockchain::types::{
    envelope_hash, BuiltTransaction, ConfirmationStatus, Operation, ScArg, TransactionEnvelope,
    DEFAULT_AWARD_REASON,
};
use crate::config::{ContractsConfig, NetworkConfig};
use crate::errors::RawError;

/// Building failed before any network call.
#[derive(Debug, Error)]
pub enum BuildError {
    /// An input did not pass validation.
    #[error("{message}")]
    Invalid { field: &'static str, message: String },

    #[error("failed to encode envelope: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl BuildError {
    fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        BuildError::Invalid {
            field,
            message: message.into(),
        }
    }
}

/// Builds unsigned envelopes for club operations.
#[derive(Debug, Clone)]
pub struct TxBuilder {
    contracts: ContractsConfig,
    network: NetworkConfig,
}

impl TxBuilder {
    pub fn new(contracts: ContractsConfig, network: NetworkConfig) -> Self {
        Self { contracts, network }
    }

    /// Build the envelope for `operation`, signed by `source`, targeting `recipient`.
    pub fn build(
        &self,
        source: &str,
        recipient: &str,
        operation: &Operation,
    ) -> Result<BuiltTransaction, BuildError> {
        if !is_valid_account_id(source) {
            return Err(BuildError::invalid("signer", "invalid signer address"));
        }
        if !is_valid_account_id(recipient) {
            return Err(BuildError::invalid("recipient", "invalid recipient address"));
        }

        let contract_id = match operation {
            Operation::IssueMembership { .. } => self.contracts.membership.as_str(),
            Operation::IssueBadge { .. } | Operation::AwardBadge { .. } => {
                self.contracts.badges_contract()
            }
        };
        if !is_valid_contract_id(contract_id) {
            return Err(BuildError::invalid("contract", "invalid contract id"));
        }

        let mut args = vec![ScArg::Address(recipient.to_string())];
        match operation {
            Operation::IssueMembership {
                tier,
                rarity,
                category,
            } => {
                args.push(ScArg::String(required("tier", tier)?));
                args.push(ScArg::String(required("rarity", rarity)?));
                args.push(ScArg::String(required("category", category)?));
            }
            Operation::IssueBadge {
                badge_id,
                name,
                description,
            } => {
                let badge_id = required("badge_id", badge_id)?;
                let name = sanitize_input(name);
                let description = sanitize_input(description);
                if !validate_metadata(&name, &description) {
                    return Err(BuildError::invalid(
                        "metadata",
                        "badge name and description are required",
                    ));
                }
                args.push(ScArg::String(badge_id));
                args.push(ScArg::String(name));
                args.push(ScArg::String(description));
            }
            Operation::AwardBadge { badge_id, reason } => {
                args.push(ScArg::String(required("badge_id", badge_id)?));
                let reason = sanitize_input(reason);
                args.push(ScArg::String(if reason.is_empty() {
                    DEFAULT_AWARD_REASON.to_string()
                } else {
                    reason
                }));
            }
        }

        let envelope = TransactionEnvelope {
            source: source.to_string(),
            contract_id: contract_id.to_string(),
            function: operation.function_name().to_string(),
            args,
            fee: self.network.base_fee,
            network_passphrase: self.network.network_passphrase.clone(),
            max_time: unix_now() + self.network.tx_timeout_secs,
        };
        let blob = envelope.to_blob()?;
        let hash = envelope_hash(&self.network.network_passphrase, &blob);

        tracing::debug!(
            operation = operation.label(),
            contract = contract_id,
            hash = %hash,
            "Envelope built"
        );

        Ok(BuiltTransaction {
            envelope,
            blob,
            hash,
        })
    }

    pub fn network_passphrase(&self) -> &str {
        &self.network.network_passphrase
    }
}

fn required(field: &'static str, value: &str) -> Result<String, BuildError> {
    let value = sanitize_input(value);
    if value.is_empty() {
        return Err(BuildError::invalid(field, format!("{} is required", field)));
    }
    Ok(value)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Wait for a submitted transaction to resolve.
///
/// Sleeps `poll_interval` before each status check and makes at most
/// `attempts` checks. Returns the ledger of inclusion when known.
pub async fn wait_for_confirmation(
    rpc: &dyn NetworkRpc,
    hash: &str,
    poll_interval: Duration,
    attempts: u32,
) -> Result<Option<u64>, RawError> {
    for attempt in 1..=attempts {
        sleep(poll_interval).await;

        match rpc.get_status(hash).await? {
            ConfirmationStatus::Confirmed { ledger } => {
                tracing::debug!(hash = hash, attempt = attempt, ledger = ?ledger, "Transaction confirmed");
                return Ok(ledger);
            }
            ConfirmationStatus::Failed(detail) => {
                return Err(RawError::new(format!("transaction rejected by ledger: {}", detail))
                    .with_code("TRANSACTION_ERROR"));
            }
            ConfirmationStatus::Pending => {
                tracing::debug!(hash = hash, attempt = attempt, max = attempts, "Transaction pending");
            }
        }
    }

    Err(RawError::new(format!(
        "transaction confirmation timeout after {} checks",
        attempts
    ))
    .with_code("TIMEOUT"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::types::{SignedEnvelope, SubmitResponse};
    use crate::errors::{classify_kind, ErrorKind};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn account(fill: char) -> String {
        format!("G{}", fill.to_string().repeat(55))
    }

    fn builder() -> TxBuilder {
        TxBuilder::new(ContractsConfig::default(), NetworkConfig::default())
    }

    struct FixedStatus {
        status: ConfirmationStatus,
        checks: AtomicU32,
    }

    #[async_trait]
    impl NetworkRpc for FixedStatus {
        async fn submit(&self, _signed: &SignedEnvelope) -> Result<SubmitResponse, RawError> {
            Err(RawError::new("not used"))
        }

        async fn get_status(&self, _hash: &str) -> Result<ConfirmationStatus, RawError> {
            self.checks.fetch_add(1, Ordering::SeqCst);
            Ok(self.status.clone())
        }
    }

    #[test]
    fn test_build_membership() {
        let built = builder()
            .build(&account('A'), &account('B'), &Operation::default_membership())
            .unwrap();
        assert_eq!(built.envelope.function, "issue_membership");
        assert_eq!(built.envelope.args.len(), 4);
        assert_eq!(built.envelope.args[1], ScArg::String("VIP".to_string()));
        assert_eq!(built.hash.len(), 64);
        assert_eq!(TransactionEnvelope::from_blob(&built.blob).unwrap(), built.envelope);
    }

    #[test]
    fn test_build_rejects_bad_recipient() {
        let err = builder()
            .build(&account('A'), "GNOTVALID", &Operation::default_membership())
            .unwrap_err();
        assert!(matches!(err, BuildError::Invalid { field: "recipient", .. }));
    }

    #[test]
    fn test_build_requires_badge_metadata() {
        let op = Operation::IssueBadge {
            badge_id: "early".into(),
            name: "<>".into(),
            description: "First members".into(),
        };
        let err = builder().build(&account('A'), &account('B'), &op).unwrap_err();
        assert!(matches!(err, BuildError::Invalid { field: "metadata", .. }));
    }

    #[test]
    fn test_award_defaults_reason() {
        let op = Operation::AwardBadge {
            badge_id: "early".into(),
            reason: "   ".into(),
        };
        let built = builder().build(&account('A'), &account('B'), &op).unwrap();
        assert_eq!(
            built.envelope.args.last(),
            Some(&ScArg::String(DEFAULT_AWARD_REASON.to_string()))
        );
    }

    #[tokio::test]
    async fn test_polling_exhausts_attempts() {
        let rpc = FixedStatus {
            status: ConfirmationStatus::Pending,
            checks: AtomicU32::new(0),
        };
        let err = wait_for_confirmation(&rpc, "ff", Duration::from_millis(1), 3)
            .await
            .unwrap_err();
        assert_eq!(rpc.checks.load(Ordering::SeqCst), 3);
        assert_eq!(classify_kind(&err), ErrorKind::TimeoutError);
    }

    #[tokio::test]
    async fn test_ledger_rejection() {
        let rpc = FixedStatus {
            status: ConfirmationStatus::Failed("AAAAAg==".into()),
            checks: AtomicU32::new(0),
        };
        let err = wait_for_confirmation(&rpc, "ff", Duration::from_millis(1), 5)
            .await
            .unwrap_err();
        assert_eq!(rpc.checks.load(Ordering::SeqCst), 1);
        assert_eq!(classify_kind(&err), ErrorKind::TransactionError);
    }
}
