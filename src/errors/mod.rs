//! Error classification subsystem.
//!
//! # Data Flow
//! ```text
//! External failure (RPC, wallet, health probe)
//!     → RawError { message, code }
//!     → classifier.rs (ordered heuristics → ErrorKind)
//!     → kind.rs (static retryable table)
//!     → messages.rs (localized user-facing text)
//!     → BlockchainError (immutable, serializable)
//! ```
//!
//! # Design Decisions
//! - Callers never branch on raw error text, only on `ErrorKind`
//! - Local validation failures skip the heuristics entirely
//! - User-facing text comes from a fixed table, never from the raw error

pub mod classifier;
pub mod kind;
pub mod messages;

pub use classifier::{classify_kind, BlockchainError, ErrorClassifier, ErrorCode, RawError};
pub use kind::ErrorKind;
pub use messages::{user_message, Locale};
