//! Closed error taxonomy.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a classified blockchain failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    NetworkError,
    WalletError,
    ContractError,
    TransactionError,
    ValidationError,
    TimeoutError,
    InsufficientFunds,
    UserRejected,
    UnknownError,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 9] = [
        ErrorKind::NetworkError,
        ErrorKind::WalletError,
        ErrorKind::ContractError,
        ErrorKind::TransactionError,
        ErrorKind::ValidationError,
        ErrorKind::TimeoutError,
        ErrorKind::InsufficientFunds,
        ErrorKind::UserRejected,
        ErrorKind::UnknownError,
    ];

    /// Whether a failure of this kind is worth another attempt.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            ErrorKind::NetworkError | ErrorKind::TimeoutError | ErrorKind::TransactionError
        )
    }

    /// Stable wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NetworkError => "NETWORK_ERROR",
            ErrorKind::WalletError => "WALLET_ERROR",
            ErrorKind::ContractError => "CONTRACT_ERROR",
            ErrorKind::TransactionError => "TRANSACTION_ERROR",
            ErrorKind::ValidationError => "VALIDATION_ERROR",
            ErrorKind::TimeoutError => "TIMEOUT_ERROR",
            ErrorKind::InsufficientFunds => "INSUFFICIENT_FUNDS",
            ErrorKind::UserRejected => "USER_REJECTED",
            ErrorKind::UnknownError => "UNKNOWN_ERROR",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
