//! Retry policy for orchestration runs.
//!
//! # Responsibilities
//! - Decide whether a classified failure earns another attempt
//! - Compute the delay before that attempt
//!
//! # Design Decisions
//! - Only the error's `retryable` flag is consulted, never its text
//! - The attempt ceiling counts the first attempt

use rand::Rng;
use std::time::Duration;

use crate::config::TransactionConfig;
use crate::errors::BlockchainError;

/// Bounded retry with exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl RetryPolicy {
    pub fn from_config(config: &TransactionConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay_ms: config.base_delay_ms,
            max_delay_ms: config.max_delay_ms,
        }
    }

    /// Whether `err`, observed on attempt `attempt` (1-based), may be retried.
    pub fn should_retry(&self, err: &BlockchainError, attempt: u32) -> bool {
        err.is_retryable() && attempt < self.max_attempts
    }

    /// Delay before the attempt following `attempt`.
    ///
    /// Doubles from `base_delay_ms` per failed attempt, capped at
    /// `max_delay_ms`, plus up to a quarter of that on top.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let Some(doublings) = attempt.checked_sub(1) else {
            return Duration::ZERO;
        };
        let factor = 1u64.checked_shl(doublings).unwrap_or(u64::MAX);
        let ceiling = self.base_delay_ms.saturating_mul(factor).min(self.max_delay_ms);
        let spread = rand::thread_rng().gen_range(0..=ceiling / 4);
        Duration::from_millis(ceiling + spread)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&TransactionConfig::default())
    }
}
