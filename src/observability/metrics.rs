//! Metrics collection and exposition.
//!
//! # Metrics
//! - `club_cache_hits_total` (counter): hits by category and tier
//! - `club_cache_misses_total` (counter): misses by category
//! - `club_cache_evictions_total` (counter): capacity evictions by category
//! - `club_cache_persist_failures_total` (counter): swallowed storage errors
//! - `club_transactions_total` (counter): terminal outcomes by operation
//! - `club_transaction_retries_total` (counter): retry attempts by operation
//! - `club_network_health` (gauge): 1=reachable, 0=unreachable
//!
//! Recording is a no-op until a recorder is installed, so library users and
//! tests pay nothing.

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_cache_hit(category: &'static str, tier: &'static str) {
    counter!("club_cache_hits_total", "category" => category, "tier" => tier).increment(1);
}

pub fn record_cache_miss(category: &'static str) {
    counter!("club_cache_misses_total", "category" => category).increment(1);
}

pub fn record_cache_eviction(category: &'static str) {
    counter!("club_cache_evictions_total", "category" => category).increment(1);
}

pub fn record_persist_failure(operation: &'static str) {
    counter!("club_cache_persist_failures_total", "operation" => operation).increment(1);
}

pub fn record_transaction_outcome(operation: &'static str, outcome: &'static str) {
    counter!("club_transactions_total", "operation" => operation, "outcome" => outcome)
        .increment(1);
}

pub fn record_transaction_retry(operation: &'static str) {
    counter!("club_transaction_retries_total", "operation" => operation).increment(1);
}

pub fn record_network_health(endpoint: &'static str, healthy: bool) {
    gauge!("club_network_health", "endpoint" => endpoint).set(if healthy { 1.0 } else { 0.0 });
}
