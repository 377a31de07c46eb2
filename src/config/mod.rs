//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ClubConfig (validated, immutable)
//!     → sections handed to cache, orchestrator, admin at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Cache category policies are constants, not configuration

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_or_default, ConfigError};
pub use schema::{
    AdminConfig, CacheConfig, ClubConfig, ContractsConfig, NetworkConfig, ObservabilityConfig,
    TransactionConfig, WalletConfig,
};
