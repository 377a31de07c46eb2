//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Operation + signer + recipient
//!     → address.rs (format predicates, sanitizing)
//!     → transaction.rs (build unsigned envelope)
//!     → wallet.rs (external signer, may wait on the user)
//!     → client.rs (submit, poll status over JSON-RPC)
//! ```
//!
//! # Security Constraints
//! - No signing keys are ever held by this process
//! - All RPC calls have configurable timeouts
//! - Transport failures surface as `RawError` for classification

pub mod address;
pub mod client;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use client::{NetworkRpc, SorobanRpcClient};
pub use transaction::{wait_for_confirmation, BuildError, TxBuilder};
pub use types::{
    BuiltTransaction, ConfirmationStatus, Operation, SignedEnvelope, SubmitResponse, SubmitStatus,
    TransactionEnvelope, TransportError,
};
pub use wallet::{HttpWalletBridge, SignError, SignOptions, WalletSigner};
