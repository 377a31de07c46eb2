//! Two-endpoint network probe.
//!
//! # Responsibilities
//! - Probe Horizon (plain GET) and Soroban RPC (`getHealth`) concurrently
//! - Bound every probe with the configured connection timeout
//! - Record reachability gauges

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time;

use crate::blockchain::client::SorobanRpcClient;
use crate::config::NetworkConfig;
use crate::errors::RawError;
use crate::observability::metrics;

/// Cache lifetime of a failed check, short so recovery shows up quickly.
pub const UNHEALTHY_TTL: Duration = Duration::from_secs(5);

/// Reachability of the two external endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkHealth {
    pub horizon: bool,
    pub soroban: bool,
    /// One entry per failed probe.
    pub errors: Vec<String>,
}

impl NetworkHealth {
    pub fn is_healthy(&self) -> bool {
        self.horizon && self.soroban
    }

    /// TTL override for the network-status entry. Healthy results keep the
    /// category default.
    pub fn cache_ttl(&self) -> Option<Duration> {
        (!self.is_healthy()).then_some(UNHEALTHY_TTL)
    }

    /// Failure to hand to the classifier when the network is unusable.
    pub fn to_raw_error(&self) -> Option<RawError> {
        if self.is_healthy() {
            return None;
        }
        let detail = if self.errors.is_empty() {
            "endpoint unreachable".to_string()
        } else {
            self.errors.join("; ")
        };
        Some(RawError::new(format!("network unavailable: {}", detail)).with_code("NETWORK_ERROR"))
    }
}

/// Network reachability probe.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn check(&self) -> NetworkHealth;
}

/// Probes the configured Horizon and Soroban endpoints over HTTP.
pub struct HttpHealthChecker {
    http: reqwest::Client,
    horizon_url: String,
    rpc: SorobanRpcClient,
    timeout: Duration,
}

impl HttpHealthChecker {
    pub fn new(config: &NetworkConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            horizon_url: config.horizon_url.clone(),
            rpc: SorobanRpcClient::new(config),
            timeout: Duration::from_millis(config.connection_timeout_ms),
        }
    }

    async fn probe_horizon(&self) -> Result<(), String> {
        let request = self
            .http
            .get(&self.horizon_url)
            .header("user-agent", "club-core-health-check")
            .send();

        match time::timeout(self.timeout, request).await {
            Ok(Ok(response)) if response.status().is_success() => Ok(()),
            Ok(Ok(response)) => {
                tracing::warn!(url = %self.horizon_url, status = %response.status(), "Horizon probe failed: non-success status");
                Err(format!("horizon returned {}", response.status()))
            }
            Ok(Err(e)) => {
                tracing::warn!(url = %self.horizon_url, error = %e, "Horizon probe failed: connection error");
                Err(format!("horizon: {}", e))
            }
            Err(_) => {
                tracing::warn!(url = %self.horizon_url, "Horizon probe failed: timeout");
                Err("horizon: request timeout".to_string())
            }
        }
    }

    async fn probe_soroban(&self) -> Result<(), String> {
        match self.rpc.get_health().await {
            Ok(true) => Ok(()),
            Ok(false) => {
                tracing::warn!(url = %self.rpc.rpc_url(), "Soroban probe failed: reported unhealthy");
                Err("soroban reported unhealthy".to_string())
            }
            Err(e) => {
                tracing::warn!(url = %self.rpc.rpc_url(), error = %e, "Soroban probe failed");
                Err(format!("soroban: {}", e))
            }
        }
    }
}

#[async_trait]
impl HealthCheck for HttpHealthChecker {
    async fn check(&self) -> NetworkHealth {
        let (horizon, soroban) = tokio::join!(self.probe_horizon(), self.probe_soroban());

        metrics::record_network_health("horizon", horizon.is_ok());
        metrics::record_network_health("soroban", soroban.is_ok());

        let errors = [horizon.as_ref().err(), soroban.as_ref().err()]
            .into_iter()
            .flatten()
            .cloned()
            .collect();

        NetworkHealth {
            horizon: horizon.is_ok(),
            soroban: soroban.is_ok(),
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{classify_kind, ErrorKind};

    #[test]
    fn test_healthy_has_no_error() {
        let health = NetworkHealth {
            horizon: true,
            soroban: true,
            errors: vec![],
        };
        assert!(health.to_raw_error().is_none());
    }

    #[test]
    fn test_only_failures_shorten_cache_ttl() {
        let mut health = NetworkHealth {
            horizon: true,
            soroban: true,
            errors: vec![],
        };
        assert_eq!(health.cache_ttl(), None);
        health.soroban = false;
        assert_eq!(health.cache_ttl(), Some(UNHEALTHY_TTL));
    }

    #[test]
    fn test_unhealthy_classifies_as_network() {
        let health = NetworkHealth {
            horizon: true,
            soroban: false,
            errors: vec!["soroban: request timeout after 10000 ms".into()],
        };
        let raw = health.to_raw_error().unwrap();
        assert_eq!(classify_kind(&raw), ErrorKind::NetworkError);
    }

    #[tokio::test]
    async fn test_unreachable_endpoints() {
        let config = NetworkConfig {
            horizon_url: "http://127.0.0.1:9".to_string(),
            rpc_url: "http://127.0.0.1:9".to_string(),
            connection_timeout_ms: 2000,
            ..NetworkConfig::default()
        };
        let health = HttpHealthChecker::new(&config).check().await;
        assert!(!health.horizon);
        assert!(!health.soroban);
        assert_eq!(health.errors.len(), 2);
    }
}
