//! Error classification.
//!
//! Turns a raw failure from the network, the wallet or local validation into
//! a [`BlockchainError`] with a stable kind, a retry flag and a localized
//! message. Heuristics are checked in priority order:
//!
//! ```text
//! network → wallet → user rejected → insufficient funds → timeout
//!         → contract → transaction → validation → unknown
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::errors::kind::ErrorKind;
use crate::errors::messages::{user_message, Locale};

/// Error code attached by an external capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorCode {
    Number(i64),
    Text(String),
}

impl ErrorCode {
    fn is_text(&self, expected: &str) -> bool {
        matches!(self, ErrorCode::Text(t) if t == expected)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Number(n) => write!(f, "{}", n),
            ErrorCode::Text(t) => f.write_str(t),
        }
    }
}

impl From<i64> for ErrorCode {
    fn from(n: i64) -> Self {
        ErrorCode::Number(n)
    }
}

impl From<&str> for ErrorCode {
    fn from(t: &str) -> Self {
        ErrorCode::Text(t.to_string())
    }
}

/// Wallet code for a user-declined request.
pub const USER_REJECTED_CODE: i64 = 4001;

/// An unclassified failure as reported by an external capability.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct RawError {
    pub message: String,
    pub code: Option<ErrorCode>,
}

impl RawError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<ErrorCode>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Capture any error by its rendered message.
    pub fn from_error(err: &dyn std::error::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// A classified failure. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{kind}: {message}")]
#[serde(rename_all = "camelCase")]
pub struct BlockchainError {
    #[serde(rename = "type")]
    kind: ErrorKind,
    message: String,
    original_error: Option<String>,
    code: Option<ErrorCode>,
    details: BTreeMap<String, String>,
    timestamp: u64,
    retryable: bool,
    user_friendly_message: String,
}

impl BlockchainError {
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn original_error(&self) -> Option<&str> {
        self.original_error.as_deref()
    }

    pub fn code(&self) -> Option<&ErrorCode> {
        self.code.as_ref()
    }

    pub fn details(&self) -> &BTreeMap<String, String> {
        &self.details
    }

    /// Creation time in milliseconds since the epoch.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn is_retryable(&self) -> bool {
        self.retryable
    }

    pub fn user_friendly_message(&self) -> &str {
        &self.user_friendly_message
    }
}

/// Pick the kind for a raw failure. Pure; first matching rule wins.
pub fn classify_kind(raw: &RawError) -> ErrorKind {
    let message = raw.message.to_lowercase();
    let code = raw.code.as_ref();
    let has = |needles: &[&str]| needles.iter().any(|n| message.contains(n));
    let code_is = |text: &str| code.is_some_and(|c| c.is_text(text));

    if has(&["network", "fetch"]) || code_is("NETWORK_ERROR") {
        ErrorKind::NetworkError
    } else if has(&["wallet", "freighter"]) || code_is("WALLET_ERROR") {
        ErrorKind::WalletError
    } else if has(&["user rejected", "user denied"])
        || code == Some(&ErrorCode::Number(USER_REJECTED_CODE))
    {
        ErrorKind::UserRejected
    } else if has(&["insufficient", "balance"]) || code_is("INSUFFICIENT_FUNDS") {
        ErrorKind::InsufficientFunds
    } else if has(&["timeout", "timed out"]) || code_is("TIMEOUT") {
        ErrorKind::TimeoutError
    } else if has(&["contract", "soroban"]) || code_is("CONTRACT_ERROR") {
        ErrorKind::ContractError
    } else if has(&["transaction", "tx"]) || code_is("TRANSACTION_ERROR") {
        ErrorKind::TransactionError
    } else if has(&["invalid", "validation"]) || code_is("VALIDATION_ERROR") {
        ErrorKind::ValidationError
    } else {
        ErrorKind::UnknownError
    }
}

/// Builds [`BlockchainError`]s with messages in one locale.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorClassifier {
    locale: Locale,
}

impl ErrorClassifier {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Classify a raw failure observed while doing `context`.
    pub fn classify(&self, raw: &RawError, context: &str) -> BlockchainError {
        let kind = classify_kind(raw);
        tracing::debug!(
            kind = %kind,
            retryable = kind.is_retryable(),
            context = context,
            error = %raw.message,
            "Classified blockchain error"
        );
        self.build(kind, raw.message.clone(), Some(raw.message.clone()), raw.code.clone(), context)
    }

    /// A local input check failed. Never goes through the heuristics, so the
    /// wording of `message` cannot change the kind.
    pub fn validation(&self, message: impl Into<String>, field: &str) -> BlockchainError {
        let mut err = self.build(
            ErrorKind::ValidationError,
            message.into(),
            None,
            Some(ErrorCode::from("VALIDATION_ERROR")),
            "input validation",
        );
        err.details.insert("field".to_string(), field.to_string());
        err
    }

    fn build(
        &self,
        kind: ErrorKind,
        message: String,
        original_error: Option<String>,
        code: Option<ErrorCode>,
        context: &str,
    ) -> BlockchainError {
        let message = if message.trim().is_empty() {
            "unknown error".to_string()
        } else {
            message
        };
        let mut details = BTreeMap::new();
        details.insert("context".to_string(), context.to_string());

        BlockchainError {
            kind,
            message,
            original_error,
            code,
            details,
            timestamp: now_ms(),
            retryable: kind.is_retryable(),
            user_friendly_message: user_message(kind, self.locale).to_string(),
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind_of(message: &str) -> ErrorKind {
        classify_kind(&RawError::new(message))
    }

    #[test]
    fn test_insufficient_balance() {
        let err = ErrorClassifier::default()
            .classify(&RawError::new("op_underfunded: Insufficient Balance"), "submit");
        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_timeout_is_retryable() {
        let err = ErrorClassifier::default()
            .classify(&RawError::new("request timeout after 10s"), "poll");
        assert_eq!(err.kind(), ErrorKind::TimeoutError);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_priority_order() {
        // network beats timeout
        assert_eq!(kind_of("network timeout"), ErrorKind::NetworkError);
        // wallet beats user rejection
        assert_eq!(kind_of("wallet: user rejected"), ErrorKind::WalletError);
        // timeout beats transaction
        assert_eq!(kind_of("transaction confirmation timed out"), ErrorKind::TimeoutError);
        // contract beats validation
        assert_eq!(kind_of("invalid contract call"), ErrorKind::ContractError);
        assert_eq!(kind_of("Soroban host error"), ErrorKind::ContractError);
        assert_eq!(kind_of("invalid argument"), ErrorKind::ValidationError);
        assert_eq!(kind_of("something odd"), ErrorKind::UnknownError);
    }

    #[test]
    fn test_codes() {
        let rejected = RawError::new("request declined").with_code(USER_REJECTED_CODE);
        assert_eq!(classify_kind(&rejected), ErrorKind::UserRejected);

        let timeout = RawError::new("gave up").with_code("TIMEOUT");
        assert_eq!(classify_kind(&timeout), ErrorKind::TimeoutError);

        let other = RawError::new("gave up").with_code(500);
        assert_eq!(classify_kind(&other), ErrorKind::UnknownError);
    }

    #[test]
    fn test_validation_bypasses_heuristics() {
        let err = ErrorClassifier::new(Locale::En).validation("bad contract id", "contract");
        assert_eq!(err.kind(), ErrorKind::ValidationError);
        assert!(!err.is_retryable());
        assert_eq!(err.details()["field"], "contract");
        assert_eq!(err.user_friendly_message(), "Invalid data provided.");
    }

    #[test]
    fn test_localized_message_and_context() {
        let err = ErrorClassifier::new(Locale::PtBr)
            .classify(&RawError::new("user denied signature"), "sign");
        assert_eq!(err.kind(), ErrorKind::UserRejected);
        assert_eq!(err.user_friendly_message(), "Transação rejeitada pelo usuário.");
        assert_eq!(err.details()["context"], "sign");
        assert_eq!(err.original_error(), Some("user denied signature"));
        assert!(err.timestamp() > 0);
    }

    #[test]
    fn test_empty_message() {
        let err = ErrorClassifier::default().classify(&RawError::new(""), "build");
        assert_eq!(err.kind(), ErrorKind::UnknownError);
        assert_eq!(err.message(), "unknown error");
    }

    #[test]
    fn test_serialized_shape() {
        let err = ErrorClassifier::default().classify(&RawError::new("fetch failed"), "health");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["type"], "NETWORK_ERROR");
        assert_eq!(json["retryable"], true);
        assert_eq!(json["originalError"], "fetch failed");
        assert!(json["userFriendlyMessage"].as_str().is_some_and(|m| !m.is_empty()));
        assert!(json.get("user_friendly_message").is_none());
        assert!(json.get("original_error").is_none());
    }
}
