//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate endpoint URLs and contract identifiers
//! - Validate value ranges (poll interval > 0, timeout covers one poll)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ClubConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;

use crate::blockchain::address::{is_valid_account_id, is_valid_contract_id};
use crate::config::schema::{ClubConfig, ADMIN_KEY_PLACEHOLDER};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    /// What is wrong with it.
    pub reason: String,
}

impl ValidationError {
    fn new(field: &str, reason: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Check the configuration for semantic errors.
pub fn validate_config(config: &ClubConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_url(&mut errors, "network.horizon_url", &config.network.horizon_url);
    check_url(&mut errors, "network.rpc_url", &config.network.rpc_url);
    check_url(&mut errors, "wallet.bridge_url", &config.wallet.bridge_url);

    if config.network.network_passphrase.trim().is_empty() {
        errors.push(ValidationError::new("network.network_passphrase", "must not be empty"));
    }

    let signer = &config.wallet.signer_address;
    if !signer.is_empty() && !is_valid_account_id(signer) {
        errors.push(ValidationError::new("wallet.signer_address", "not a valid account id"));
    }

    if !is_valid_contract_id(&config.contracts.membership) {
        errors.push(ValidationError::new("contracts.membership", "not a valid contract id"));
    }
    if !config.contracts.badges.is_empty() && !is_valid_contract_id(&config.contracts.badges) {
        errors.push(ValidationError::new("contracts.badges", "not a valid contract id"));
    }

    let tx = &config.transactions;
    if tx.max_attempts == 0 {
        errors.push(ValidationError::new("transactions.max_attempts", "must be at least 1"));
    }
    if tx.poll_interval_ms == 0 {
        errors.push(ValidationError::new("transactions.poll_interval_ms", "must be greater than 0"));
    } else if tx.confirmation_timeout_ms < tx.poll_interval_ms {
        errors.push(ValidationError::new(
            "transactions.confirmation_timeout_ms",
            "must be at least one poll interval",
        ));
    }
    if tx.base_delay_ms > tx.max_delay_ms {
        errors.push(ValidationError::new(
            "transactions.base_delay_ms",
            "must not exceed max_delay_ms",
        ));
    }

    if config.cache.persistent {
        if let Some(path) = &config.cache.path {
            if path.trim().is_empty() {
                errors.push(ValidationError::new("cache.path", "must not be blank"));
            }
        }
    }

    if config.admin.enabled {
        if config.admin.api_key == ADMIN_KEY_PLACEHOLDER || config.admin.api_key.len() < 16 {
            errors.push(ValidationError::new(
                "admin.api_key",
                "set a key of at least 16 characters",
            ));
        }
        if config.admin.bind_address.parse::<std::net::SocketAddr>().is_err() {
            errors.push(ValidationError::new("admin.bind_address", "not a socket address"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    match url::Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::new(
            field,
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(field, e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> ClubConfig {
        let mut config = ClubConfig::default();
        config.admin.api_key = "a-long-enough-admin-key".to_string();
        config
    }

    #[test]
    fn test_defaults_with_real_key_are_valid() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_placeholder_key_rejected() {
        let config = ClubConfig::default();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "admin.api_key"));
    }

    #[test]
    fn test_reports_every_error() {
        let mut config = valid_config();
        config.network.rpc_url = "not a url".to_string();
        config.contracts.membership = "GABC".to_string();
        config.transactions.poll_interval_ms = 0;
        config.transactions.max_attempts = 0;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"network.rpc_url"));
        assert!(fields.contains(&"contracts.membership"));
        assert!(fields.contains(&"transactions.poll_interval_ms"));
        assert!(fields.contains(&"transactions.max_attempts"));
    }

    #[test]
    fn test_timeout_shorter_than_poll() {
        let mut config = valid_config();
        config.transactions.poll_interval_ms = 5000;
        config.transactions.confirmation_timeout_ms = 1000;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "transactions.confirmation_timeout_ms");
    }

    #[test]
    fn test_signer_address_format() {
        let mut config = valid_config();
        config.wallet.signer_address = "SBADSEED".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "wallet.signer_address");

        config.wallet.signer_address = format!("G{}", "A".repeat(55));
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_admin_disabled_skips_key_check() {
        let mut config = ClubConfig::default();
        config.admin.enabled = false;
        assert!(validate_config(&config).is_ok());
    }
}
