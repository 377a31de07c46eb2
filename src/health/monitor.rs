//! Periodic network probing.
//!
//! # Responsibilities
//! - Probe the network on a fixed interval
//! - Keep the network-status cache entry warm for readers

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time;

use crate::cache::BlockchainCache;
use crate::health::probe::{HealthCheck, NetworkHealth};

pub struct NetworkMonitor {
    health: Arc<dyn HealthCheck>,
    cache: BlockchainCache,
    interval: Duration,
}

impl NetworkMonitor {
    pub fn new(health: Arc<dyn HealthCheck>, cache: BlockchainCache, interval: Duration) -> Self {
        Self {
            health,
            cache,
            interval,
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if self.interval.is_zero() {
            tracing::info!("Network monitor disabled");
            return;
        }

        tracing::info!(interval_secs = self.interval.as_secs(), "Network monitor starting");
        let mut ticker = time::interval(self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.probe_once().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Network monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Probe and store the result under the network-status key.
    pub async fn probe_once(&self) -> NetworkHealth {
        let health = self.health.check().await;
        if !health.is_healthy() {
            tracing::warn!(
                horizon = health.horizon,
                soroban = health.soroban,
                errors = ?health.errors,
                "Network probe failed"
            );
        }
        if let Err(e) = self.cache.set_network_status(&health, health.cache_ttl()).await {
            tracing::warn!(error = %e, "Failed to cache network status");
        }
        health
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheManager, Clock, ManualClock};
    use crate::health::probe::UNHEALTHY_TTL;
    use async_trait::async_trait;

    struct AlwaysDown;

    #[async_trait]
    impl HealthCheck for AlwaysDown {
        async fn check(&self) -> NetworkHealth {
            NetworkHealth {
                horizon: false,
                soroban: true,
                errors: vec!["horizon returned 503 Service Unavailable".into()],
            }
        }
    }

    #[tokio::test]
    async fn test_probe_populates_cache() {
        let cache = BlockchainCache::new(Arc::new(CacheManager::new(None)));
        let monitor = NetworkMonitor::new(Arc::new(AlwaysDown), cache.clone(), Duration::from_secs(30));
        monitor.probe_once().await;

        let cached: NetworkHealth = cache.network_status().await.unwrap();
        assert!(!cached.horizon);
    }

    #[tokio::test]
    async fn test_failed_check_expires_quickly() {
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        let manager = CacheManager::with_clock(None, clock.clone() as Arc<dyn Clock>);
        let cache = BlockchainCache::new(Arc::new(manager));
        let monitor = NetworkMonitor::new(Arc::new(AlwaysDown), cache.clone(), Duration::from_secs(30));
        monitor.probe_once().await;

        clock.advance(UNHEALTHY_TTL + Duration::from_secs(1));
        assert!(cache.network_status::<NetworkHealth>().await.is_none());
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let cache = BlockchainCache::new(Arc::new(CacheManager::new(None)));
        let monitor = NetworkMonitor::new(Arc::new(AlwaysDown), cache, Duration::from_millis(5));
        let (tx, rx) = broadcast::channel(1);
        let handle = tokio::spawn(monitor.run(rx));
        tokio::time::sleep(Duration::from_millis(20)).await;
        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
