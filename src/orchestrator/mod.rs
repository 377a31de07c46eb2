//! Transaction orchestration subsystem.
//!
//! # Data Flow
//! ```text
//! TransactionRequest { signer, recipient, operation }
//!     → validate: health probe (both endpoints)
//!     → build: TxBuilder (input checks, envelope)
//!     → ┌ sign: WalletSigner
//!       │ submit: NetworkRpc::submit
//!       └ confirm: poll NetworkRpc::get_status   ← retried with backoff
//!     → TransactionState (success + hash | error + BlockchainError)
//! ```
//!
//! # Design Decisions
//! - state.rs is pure and knows nothing about I/O
//! - runner.rs owns one state per run and publishes it on every change
//! - Exactly one step is marked failed on error; which one is visible to the UI
//! - While a run is loading exactly one step is running; hand-offs use `advance`

pub mod runner;
pub mod state;

pub use runner::{OrchestratorSettings, TransactionOrchestrator, TransactionRequest};
pub use state::{LoadingState, Step, StepId, TransactionState};
