//! Club core daemon.
//!
//! # Architecture Overview
//!
//! ```text
//!   club-cli / admin client
//!          │  bearer key
//!          ▼
//!   ┌──────────────┐     ┌───────────────────────────┐      ┌───────────────┐
//!   │  admin API   │────▶│ TransactionOrchestrator   │─────▶│ wallet bridge │
//!   │   (axum)     │     │ validate → build → sign   │      └───────────────┘
//!   └──────┬───────┘     │ → submit → confirm        │      ┌───────────────┐
//!          │             │ retry + error classifier  │─────▶│ Soroban RPC   │
//!          │             └────────────┬──────────────┘      └───────────────┘
//!          ▼                          ▼
//!   ┌──────────────────────────────────────────┐            ┌───────────────┐
//!   │ CacheManager: fast map → LRU → JSON file  │◀──────────│ NetworkMonitor│
//!   └──────────────────────────────────────────┘            └───────────────┘
//! ```
//!
//! The config path is the first argument (default `club.toml`); a missing
//! file falls back to validated defaults.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::net::TcpListener;

use club_core::admin::{setup_admin_router, AdminState};
use club_core::blockchain::{HttpWalletBridge, NetworkRpc, SorobanRpcClient, TxBuilder, WalletSigner};
use club_core::cache::{BlockchainCache, CacheManager};
use club_core::config::load_or_default;
use club_core::health::{HealthCheck, HttpHealthChecker, NetworkMonitor};
use club_core::lifecycle::{forward_signals, Shutdown};
use club_core::observability::{logging, metrics};
use club_core::orchestrator::{OrchestratorSettings, TransactionOrchestrator};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("club.toml"));

    let config = Arc::new(load_or_default(&config_path)?);
    logging::init_logging(&config.observability);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "club-core starting");
    tracing::info!(
        network = %config.network.network,
        rpc_url = %config.network.rpc_url,
        persistent_cache = config.cache.persistent,
        admin_enabled = config.admin.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let manager = Arc::new(CacheManager::from_config(&config.cache)?);
    let cache = BlockchainCache::new(manager);

    let health: Arc<dyn HealthCheck> = Arc::new(HttpHealthChecker::new(&config.network));
    let rpc: Arc<dyn NetworkRpc> = Arc::new(SorobanRpcClient::new(&config.network));
    let signer: Arc<dyn WalletSigner> = Arc::new(HttpWalletBridge::new(&config.wallet));

    let orchestrator = Arc::new(
        TransactionOrchestrator::new(
            TxBuilder::new(config.contracts.clone(), config.network.clone()),
            rpc,
            signer,
            health.clone(),
            OrchestratorSettings::from_config(&config),
        )
        .with_cache(cache.clone()),
    );

    let shutdown = Shutdown::new();
    let mut tasks = Vec::new();

    if config.network.probe_interval_secs > 0 {
        let monitor = NetworkMonitor::new(
            health.clone(),
            cache.clone(),
            Duration::from_secs(config.network.probe_interval_secs),
        );
        tasks.push(tokio::spawn(monitor.run(shutdown.subscribe())));
    }

    if config.admin.enabled {
        let listener = TcpListener::bind(&config.admin.bind_address).await?;
        tracing::info!(address = %listener.local_addr()?, "Admin API listening");

        let router = setup_admin_router(AdminState {
            config: config.clone(),
            cache: cache.clone(),
            orchestrator,
            health,
            started_at: Instant::now(),
        });
        let stop = shutdown.wait();
        tasks.push(tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(stop)
                .await
            {
                tracing::error!(error = %e, "Admin server error");
            }
        }));
    } else {
        tracing::info!("Admin API disabled");
    }

    forward_signals(&shutdown).await;

    for task in tasks {
        if let Err(e) = task.await {
            tracing::error!(error = %e, "Background task panicked");
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
