//! Admin HTTP API.
//!
//! # Routes (all bearer-key protected)
//! ```text
//! GET    /admin/status               version, network, uptime
//! GET    /admin/cache                per-category stats
//! DELETE /admin/cache                clear every tier
//! DELETE /admin/cache/{category}     invalidate one category
//! GET    /admin/network              health, read through the cache
//! POST   /admin/memberships          run issue-membership
//! POST   /admin/badges               run issue-badge
//! POST   /admin/awards               run award-badge
//! ```

pub mod auth;
pub mod handlers;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::cache::BlockchainCache;
use crate::config::ClubConfig;
use crate::health::HealthCheck;
use crate::orchestrator::TransactionOrchestrator;

/// Shared state injected into admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub config: Arc<ClubConfig>,
    pub cache: BlockchainCache,
    pub orchestrator: Arc<TransactionOrchestrator>,
    pub health: Arc<dyn HealthCheck>,
    pub started_at: Instant,
}

#[allow(deprecated)]
pub fn setup_admin_router(state: AdminState) -> Router {
    let timeout = Duration::from_secs(state.config.admin.request_timeout_secs);

    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/cache", get(get_cache).delete(clear_cache))
        .route("/admin/cache/{category}", delete(invalidate_category))
        .route("/admin/network", get(get_network))
        .route("/admin/memberships", post(issue_membership))
        .route("/admin/badges", post(issue_badge))
        .route("/admin/awards", post(award_badge))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(timeout)),
        )
}
