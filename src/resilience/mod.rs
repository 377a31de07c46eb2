//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Classified failure in sign / submit / confirm:
//!     → retries.rs (retryable kind? attempts left? how long to wait?)
//!     → orchestrator runs the sequence again
//! ```
//!
//! # Design Decisions
//! - Validation, rejection and insufficient funds never retry
//! - Jittered backoff prevents synchronized resubmissions

pub mod retries;

pub use retries::RetryPolicy;
