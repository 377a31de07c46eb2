//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the club
//! service. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::errors::Locale;

/// Placeholder admin key shipped in defaults; rejected when admin is enabled.
pub const ADMIN_KEY_PLACEHOLDER: &str = "CHANGE_ME_IN_PRODUCTION";

/// Root configuration for the club service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClubConfig {
    /// Stellar / Soroban network endpoints.
    pub network: NetworkConfig,

    /// Deployed contract identifiers.
    pub contracts: ContractsConfig,

    /// Transaction retry and confirmation settings.
    pub transactions: TransactionConfig,

    /// Cache persistence settings.
    pub cache: CacheConfig,

    /// External signing bridge.
    pub wallet: WalletConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,

    /// Language of user-facing error messages.
    pub locale: Locale,
}

/// Network endpoints and envelope parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Network name (e.g. "testnet", "mainnet").
    pub network: String,

    /// Horizon server URL.
    pub horizon_url: String,

    /// Soroban JSON-RPC URL.
    pub rpc_url: String,

    /// Network passphrase bound into every envelope.
    pub network_passphrase: String,

    /// Base fee in stroops.
    pub base_fee: u32,

    /// Envelope validity window in seconds.
    pub tx_timeout_secs: u64,

    /// Timeout for each health probe / RPC request in milliseconds.
    pub connection_timeout_ms: u64,

    /// Background probe period feeding the network-status cache. 0 disables it.
    pub probe_interval_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            network: "testnet".to_string(),
            horizon_url: "https://horizon-testnet.stellar.org".to_string(),
            rpc_url: "https://soroban-testnet.stellar.org".to_string(),
            network_passphrase: "Test SDF Network ; September 2015".to_string(),
            base_fee: 1_000_000,
            tx_timeout_secs: 30,
            connection_timeout_ms: 10_000,
            probe_interval_secs: 30,
        }
    }
}

/// Contract identifiers used when building envelopes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ContractsConfig {
    /// Membership contract id.
    pub membership: String,

    /// Badges contract id. Falls back to the membership contract when empty.
    pub badges: String,
}

impl Default for ContractsConfig {
    fn default() -> Self {
        Self {
            membership: "CDLZFC3SYJYDZT7K67VZ75HPJVIEUVNIXF47ZG2FB2RMQQAHHXCN3A3M".to_string(),
            badges: String::new(),
        }
    }
}

impl ContractsConfig {
    /// Contract that receives badge operations.
    pub fn badges_contract(&self) -> &str {
        if self.badges.is_empty() {
            &self.membership
        } else {
            &self.badges
        }
    }
}

/// Retry and confirmation settings for the orchestrator.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransactionConfig {
    /// Maximum attempts of the sign+submit+confirm sequence.
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,

    /// Interval between confirmation polls in milliseconds.
    pub poll_interval_ms: u64,

    /// Total confirmation budget in milliseconds.
    pub confirmation_timeout_ms: u64,

    /// Ask the wallet for a fresh signature on every retry.
    pub resign_on_retry: bool,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            base_delay_ms: 1000,
            max_delay_ms: 8000,
            poll_interval_ms: 2000,
            confirmation_timeout_ms: 60_000,
            resign_on_retry: false,
        }
    }
}

impl TransactionConfig {
    /// Number of status checks made while waiting for confirmation.
    pub fn poll_attempts(&self) -> u32 {
        let attempts = self.confirmation_timeout_ms / self.poll_interval_ms.max(1);
        attempts.clamp(1, u32::MAX as u64) as u32
    }
}

/// Cache persistence configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable the persistent tier.
    pub persistent: bool,

    /// JSON file backing the persistent tier. In-memory when unset.
    pub path: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            persistent: true,
            path: Some("club-cache.json".to_string()),
        }
    }
}

/// Signing bridge configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WalletConfig {
    /// URL of the signing bridge endpoint.
    pub bridge_url: String,

    /// How long to wait for the user to sign, in seconds.
    pub sign_timeout_secs: u64,

    /// Account that signs admin-initiated operations when a request names none.
    pub signer_address: String,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            bridge_url: "http://127.0.0.1:8790/sign".to_string(),
            sign_timeout_secs: 300,
            signer_address: String::new(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,

    /// Request timeout in seconds. Covers wallet interaction, so keep it long.
    pub request_timeout_secs: u64,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            // WARNING: This is a placeholder! Change this in production.
            api_key: ADMIN_KEY_PLACEHOLDER.to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
            request_timeout_secs: 600,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: ClubConfig = toml::from_str("").unwrap();
        assert_eq!(config.transactions.max_attempts, 2);
        assert_eq!(config.transactions.poll_interval_ms, 2000);
        assert_eq!(config.network.network, "testnet");
        assert_eq!(config.locale, Locale::PtBr);
    }

    #[test]
    fn test_partial_section_override() {
        let config: ClubConfig = toml::from_str(
            r#"
            locale = "en"

            [transactions]
            max_attempts = 4
            resign_on_retry = true

            [cache]
            persistent = false
            "#,
        )
        .unwrap();
        assert_eq!(config.locale, Locale::En);
        assert_eq!(config.transactions.max_attempts, 4);
        assert!(config.transactions.resign_on_retry);
        assert_eq!(config.transactions.base_delay_ms, 1000);
        assert!(!config.cache.persistent);
    }

    #[test]
    fn test_poll_attempts() {
        let mut tx = TransactionConfig::default();
        assert_eq!(tx.poll_attempts(), 30);

        tx.confirmation_timeout_ms = 500;
        tx.poll_interval_ms = 2000;
        assert_eq!(tx.poll_attempts(), 1);
    }

    #[test]
    fn test_badges_contract_fallback() {
        let mut contracts = ContractsConfig::default();
        assert_eq!(contracts.badges_contract(), contracts.membership);
        contracts.badges = "CBADGES".to_string();
        assert_eq!(contracts.badges_contract(), "CBADGES");
    }
}
