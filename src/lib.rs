//! Club membership and badge service core.

pub mod admin;
pub mod blockchain;
pub mod cache;
pub mod config;
pub mod errors;
pub mod health;
pub mod lifecycle;
pub mod observability;
pub mod orchestrator;
pub mod resilience;

pub use cache::{BlockchainCache, CacheManager};
pub use config::ClubConfig;
pub use errors::{BlockchainError, ErrorClassifier, ErrorKind};
pub use lifecycle::Shutdown;
pub use orchestrator::{TransactionOrchestrator, TransactionState};
