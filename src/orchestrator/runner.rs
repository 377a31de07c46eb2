//! Orchestration runner.
//!
//! # Responsibilities
//! - Drive validate → build → sign → submit → confirm for one operation
//! - Classify every failure before it reaches the caller
//! - Retry sign/submit/confirm on retryable failures with backoff
//! - Publish every state change on a `watch` channel
//!
//! # Design Decisions
//! - Input validation happens before the retry loop and never consumes an attempt
//! - A signature from an earlier attempt is reused unless `resign_on_retry` is set
//! - Runs are independent; concurrent runs for one signer are not serialized

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::Instrument;
use uuid::Uuid;

use crate::blockchain::client::{NetworkRpc, SorobanRpcClient};
use crate::blockchain::transaction::{wait_for_confirmation, BuildError, TxBuilder};
use crate::blockchain::types::{
    BuiltTransaction, Operation, SignedEnvelope, SubmitStatus, DEFAULT_AWARD_REASON,
};
use crate::blockchain::wallet::{HttpWalletBridge, SignOptions, WalletSigner};
use crate::cache::BlockchainCache;
use crate::config::ClubConfig;
use crate::errors::{BlockchainError, ErrorClassifier, Locale, RawError};
use crate::health::{HealthCheck, HttpHealthChecker, NetworkHealth};
use crate::observability::metrics;
use crate::orchestrator::state::{StepId, TransactionState};
use crate::resilience::RetryPolicy;

/// One state-changing operation to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    /// Account that signs and pays.
    pub signer: String,
    pub recipient: String,
    pub operation: Operation,
}

/// Tunables for a [`TransactionOrchestrator`].
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub retry: RetryPolicy,
    pub poll_interval: Duration,
    pub poll_attempts: u32,
    pub resign_on_retry: bool,
    pub locale: Locale,
}

impl OrchestratorSettings {
    pub fn from_config(config: &ClubConfig) -> Self {
        let tx = &config.transactions;
        Self {
            retry: RetryPolicy::from_config(tx),
            poll_interval: Duration::from_millis(tx.poll_interval_ms),
            poll_attempts: tx.poll_attempts(),
            resign_on_retry: tx.resign_on_retry,
            locale: config.locale,
        }
    }
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self::from_config(&ClubConfig::default())
    }
}

/// Holds the run's state and publishes every change.
struct Progress<'a> {
    state: TransactionState,
    updates: &'a watch::Sender<TransactionState>,
}

impl Progress<'_> {
    fn apply(&mut self, transition: impl FnOnce(TransactionState) -> TransactionState) {
        let state = std::mem::take(&mut self.state);
        self.state = transition(state);
        tracing::debug!(
            step = ?self.state.current_step,
            state = ?self.state.loading_state,
            progress = ?self.state.progress,
            "Transaction state changed"
        );
        self.updates.send_replace(self.state.clone());
    }
}

pub struct TransactionOrchestrator {
    builder: TxBuilder,
    rpc: Arc<dyn NetworkRpc>,
    signer: Arc<dyn WalletSigner>,
    health: Arc<dyn HealthCheck>,
    settings: OrchestratorSettings,
    classifier: ErrorClassifier,
    cache: Option<BlockchainCache>,
}

impl TransactionOrchestrator {
    pub fn new(
        builder: TxBuilder,
        rpc: Arc<dyn NetworkRpc>,
        signer: Arc<dyn WalletSigner>,
        health: Arc<dyn HealthCheck>,
        settings: OrchestratorSettings,
    ) -> Self {
        let classifier = ErrorClassifier::new(settings.locale);
        Self {
            builder,
            rpc,
            signer,
            health,
            settings,
            classifier,
            cache: None,
        }
    }

    /// Orchestrator wired to the configured RPC endpoint, signing bridge and probes.
    pub fn from_config(config: &ClubConfig) -> Self {
        Self::new(
            TxBuilder::new(config.contracts.clone(), config.network.clone()),
            Arc::new(SorobanRpcClient::new(&config.network)),
            Arc::new(HttpWalletBridge::new(&config.wallet)),
            Arc::new(HttpHealthChecker::new(&config.network)),
            OrchestratorSettings::from_config(config),
        )
    }

    /// Invalidate the recipient's cached account data after each success.
    pub fn with_cache(mut self, cache: BlockchainCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Probe both endpoints; unreachable means a classified network error.
    pub async fn check_network(&self) -> Result<NetworkHealth, BlockchainError> {
        let health = self.health.check().await;
        match health.to_raw_error() {
            None => Ok(health),
            Some(raw) => {
                tracing::warn!(
                    horizon = health.horizon,
                    soroban = health.soroban,
                    "Network connectivity problems detected"
                );
                Err(self.classifier.classify(&raw, "network check"))
            }
        }
    }

    /// Run `request` to a terminal state.
    pub async fn execute(&self, request: TransactionRequest) -> TransactionState {
        let (updates, _) = watch::channel(TransactionState::new(self.settings.locale));
        self.execute_with_updates(request, &updates).await
    }

    /// Run `request`, publishing each intermediate state on `updates`.
    pub async fn execute_with_updates(
        &self,
        request: TransactionRequest,
        updates: &watch::Sender<TransactionState>,
    ) -> TransactionState {
        let run_id = Uuid::new_v4();
        let operation = request.operation.label();
        let span = tracing::info_span!("transaction", run_id = %run_id, operation = operation);

        async move {
            tracing::info!(recipient = %request.recipient, "Transaction started");
            let mut progress = Progress {
                state: TransactionState::new(self.settings.locale),
                updates,
            };
            progress.apply(|s| s);

            let outcome = self.run(&request, &mut progress).await;
            match &outcome {
                Ok(hash) => {
                    tracing::info!(hash = %hash, "Transaction confirmed");
                    metrics::record_transaction_outcome(operation, "success");
                    if let Some(cache) = &self.cache {
                        cache.invalidate_account(&request.recipient).await;
                    }
                }
                Err(err) => {
                    tracing::warn!(
                        kind = %err.kind(),
                        step = ?progress.state.current_step,
                        error = %err.message(),
                        "Transaction failed"
                    );
                    metrics::record_transaction_outcome(operation, err.kind().as_str());
                }
            }
            progress.state
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        request: &TransactionRequest,
        progress: &mut Progress<'_>,
    ) -> Result<String, BlockchainError> {
        progress.apply(|s| s.begin(StepId::Validate));
        if let Err(err) = self.check_network().await {
            progress.apply(|s| s.fail(err.clone()));
            return Err(err);
        }
        progress.apply(|s| s.advance(StepId::Validate, StepId::Build));

        let built = match self
            .builder
            .build(&request.signer, &request.recipient, &request.operation)
        {
            Ok(built) => built,
            Err(e) => {
                let err = match e {
                    BuildError::Invalid { field, message } => {
                        self.classifier.validation(message, field)
                    }
                    BuildError::Encoding(e) => {
                        self.classifier.classify(&RawError::from_error(&e), "build")
                    }
                };
                progress.apply(|s| s.fail(err.clone()));
                return Err(err);
            }
        };
        progress.apply(|s| s.advance(StepId::Build, StepId::Sign));

        let operation = request.operation.label();
        let mut signed: Option<SignedEnvelope> = None;
        let mut attempt = 1;
        loop {
            let result = self
                .sign_submit_confirm(request, &built, &mut signed, progress)
                .await;
            let err = match result {
                Ok(hash) => {
                    progress.apply(|s| s.complete(StepId::Confirm).succeed(hash.clone()));
                    return Ok(hash);
                }
                Err(err) => err,
            };

            if !self.settings.retry.should_retry(&err, attempt) {
                progress.apply(|s| s.fail(err.clone()));
                return Err(err);
            }

            let failed_step = progress.state.current_step;
            if failed_step == Some(StepId::Sign) || self.settings.resign_on_retry {
                signed = None;
            }
            let restart = if signed.is_some() {
                StepId::Submit
            } else {
                StepId::Sign
            };
            let delay = self.settings.retry.delay_for(attempt);

            tracing::warn!(
                attempt = attempt,
                max_attempts = self.settings.retry.max_attempts,
                step = ?failed_step,
                kind = %err.kind(),
                delay_ms = delay.as_millis() as u64,
                "Retrying transaction"
            );
            metrics::record_transaction_retry(operation);

            progress.apply(|s| s.retry_from(restart));
            sleep(delay).await;
            attempt += 1;
        }
    }

    /// Runs from whichever of sign or submit is currently loading. Leaves
    /// confirm loading on success.
    async fn sign_submit_confirm(
        &self,
        request: &TransactionRequest,
        built: &BuiltTransaction,
        signed: &mut Option<SignedEnvelope>,
        progress: &mut Progress<'_>,
    ) -> Result<String, BlockchainError> {
        let envelope = match signed {
            Some(envelope) => envelope.clone(),
            None => {
                let opts = SignOptions {
                    address: request.signer.clone(),
                    network_passphrase: self.builder.network_passphrase().to_string(),
                };
                let envelope = self
                    .signer
                    .sign_transaction(&built.blob, &opts)
                    .await
                    .map_err(|e| self.classifier.classify(&e.into(), "sign"))?;
                progress.apply(|s| s.advance(StepId::Sign, StepId::Submit));
                *signed = Some(envelope.clone());
                envelope
            }
        };

        let response = self
            .rpc
            .submit(&envelope)
            .await
            .map_err(|e| self.classifier.classify(&e, "submit"))?;

        let rejection = match response.status {
            SubmitStatus::Pending | SubmitStatus::Duplicate if !response.hash.is_empty() => None,
            SubmitStatus::Pending | SubmitStatus::Duplicate => {
                Some("transaction submission returned no hash".to_string())
            }
            SubmitStatus::TryAgainLater => {
                Some("transaction submission deferred, try again later".to_string())
            }
            SubmitStatus::Error => Some(format!(
                "transaction submission failed: {}",
                response.error_result.as_deref().unwrap_or("no result")
            )),
        };
        if let Some(message) = rejection {
            let raw = RawError::new(message).with_code("TRANSACTION_ERROR");
            return Err(self.classifier.classify(&raw, "submit"));
        }
        tracing::debug!(hash = %response.hash, "Transaction accepted for processing");
        progress.apply(|s| s.advance(StepId::Submit, StepId::Confirm));

        wait_for_confirmation(
            self.rpc.as_ref(),
            &response.hash,
            self.settings.poll_interval,
            self.settings.poll_attempts,
        )
        .await
        .map_err(|e| self.classifier.classify(&e, "confirm"))?;

        Ok(response.hash)
    }

    /// Issue a membership to `recipient`.
    pub async fn issue_membership(
        &self,
        signer: &str,
        recipient: &str,
        tier: &str,
        rarity: &str,
        category: &str,
    ) -> TransactionState {
        self.execute(TransactionRequest {
            signer: signer.to_string(),
            recipient: recipient.to_string(),
            operation: Operation::IssueMembership {
                tier: tier.to_string(),
                rarity: rarity.to_string(),
                category: category.to_string(),
            },
        })
        .await
    }

    /// Create a badge, held by `recipient`.
    pub async fn issue_badge(
        &self,
        signer: &str,
        recipient: &str,
        badge_id: &str,
        name: &str,
        description: &str,
    ) -> TransactionState {
        self.execute(TransactionRequest {
            signer: signer.to_string(),
            recipient: recipient.to_string(),
            operation: Operation::IssueBadge {
                badge_id: badge_id.to_string(),
                name: name.to_string(),
                description: description.to_string(),
            },
        })
        .await
    }

    /// Award an existing badge to `recipient`.
    pub async fn award_badge(
        &self,
        signer: &str,
        recipient: &str,
        badge_id: &str,
        reason: Option<&str>,
    ) -> TransactionState {
        self.execute(TransactionRequest {
            signer: signer.to_string(),
            recipient: recipient.to_string(),
            operation: Operation::AwardBadge {
                badge_id: badge_id.to_string(),
                reason: reason.unwrap_or(DEFAULT_AWARD_REASON).to_string(),
            },
        })
        .await
    }
}

impl std::fmt::Debug for TransactionOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionOrchestrator")
            .field("builder", &self.builder)
            .field("settings", &self.settings)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_from_config() {
        let mut config = ClubConfig::default();
        config.transactions.poll_interval_ms = 500;
        config.transactions.confirmation_timeout_ms = 2_000;
        config.locale = Locale::En;

        let settings = OrchestratorSettings::from_config(&config);
        assert_eq!(settings.poll_attempts, 4);
        assert_eq!(settings.poll_interval, Duration::from_millis(500));
        assert_eq!(settings.retry.max_attempts, 2);
        assert_eq!(settings.locale, Locale::En);
        assert!(!settings.resign_on_retry);
    }
}
