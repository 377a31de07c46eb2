use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::admin::AdminState;
use crate::blockchain::types::{DEFAULT_CATEGORY, DEFAULT_RARITY, DEFAULT_TIER};
use crate::cache::{CacheCategory, CategoryStats};
use crate::errors::ErrorKind;
use crate::health::NetworkHealth;
use crate::orchestrator::{LoadingState, TransactionState};

#[derive(Debug, Serialize, Deserialize)]
pub struct SystemStatus {
    pub version: String,
    pub status: String,
    pub network: String,
    pub uptime_secs: u64,
    pub persistent_cache: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MembershipRequest {
    pub recipient: String,
    #[serde(default)]
    pub signer: Option<String>,
    #[serde(default)]
    pub tier: Option<String>,
    #[serde(default)]
    pub rarity: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BadgeRequest {
    pub recipient: String,
    #[serde(default)]
    pub signer: Option<String>,
    pub badge_id: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AwardRequest {
    pub recipient: String,
    #[serde(default)]
    pub signer: Option<String>,
    pub badge_id: String,
    #[serde(default)]
    pub reason: Option<String>,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "operational".to_string(),
        network: state.config.network.network.clone(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        persistent_cache: state.cache.manager().is_persistent(),
    })
}

pub async fn get_cache(State(state): State<AdminState>) -> Json<Vec<CategoryStats>> {
    Json(state.cache.manager().stats())
}

pub async fn clear_cache(State(state): State<AdminState>) -> StatusCode {
    state.cache.manager().clear().await;
    StatusCode::NO_CONTENT
}

pub async fn invalidate_category(
    State(state): State<AdminState>,
    Path(category): Path<String>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    let category = category.parse::<CacheCategory>().map_err(|e| {
        (
            StatusCode::NOT_FOUND,
            Json(ApiError {
                error: e.to_string(),
            }),
        )
    })?;
    state.cache.manager().invalidate_type(category).await;
    Ok(StatusCode::NO_CONTENT)
}

/// Network health, served from the network-status cache entry when fresh.
/// A failed check is cached only briefly.
pub async fn get_network(State(state): State<AdminState>) -> Json<NetworkHealth> {
    if let Some(health) = state.cache.network_status::<NetworkHealth>().await {
        return Json(health);
    }
    let health = state.health.check().await;
    if let Err(e) = state.cache.set_network_status(&health, health.cache_ttl()).await {
        tracing::warn!(error = %e, "Failed to cache network status");
    }
    Json(health)
}

fn signer_for(state: &AdminState, signer: Option<String>) -> String {
    signer.unwrap_or_else(|| state.config.wallet.signer_address.clone())
}

/// 200 on success, 400 for rejected input, 502 for everything that failed downstream.
fn respond(state: TransactionState) -> (StatusCode, Json<TransactionState>) {
    let status = match (&state.loading_state, state.error.as_ref().map(|e| e.kind())) {
        (LoadingState::Success, _) => StatusCode::OK,
        (_, Some(ErrorKind::ValidationError)) => StatusCode::BAD_REQUEST,
        _ => StatusCode::BAD_GATEWAY,
    };
    (status, Json(state))
}

pub async fn issue_membership(
    State(state): State<AdminState>,
    Json(body): Json<MembershipRequest>,
) -> (StatusCode, Json<TransactionState>) {
    let signer = signer_for(&state, body.signer);
    let result = state
        .orchestrator
        .issue_membership(
            &signer,
            &body.recipient,
            body.tier.as_deref().unwrap_or(DEFAULT_TIER),
            body.rarity.as_deref().unwrap_or(DEFAULT_RARITY),
            body.category.as_deref().unwrap_or(DEFAULT_CATEGORY),
        )
        .await;
    respond(result)
}

pub async fn issue_badge(
    State(state): State<AdminState>,
    Json(body): Json<BadgeRequest>,
) -> (StatusCode, Json<TransactionState>) {
    let signer = signer_for(&state, body.signer);
    let result = state
        .orchestrator
        .issue_badge(
            &signer,
            &body.recipient,
            &body.badge_id,
            &body.name,
            &body.description,
        )
        .await;
    respond(result)
}

pub async fn award_badge(
    State(state): State<AdminState>,
    Json(body): Json<AwardRequest>,
) -> (StatusCode, Json<TransactionState>) {
    let signer = signer_for(&state, body.signer);
    let result = state
        .orchestrator
        .award_badge(&signer, &body.recipient, &body.badge_id, body.reason.as_deref())
        .await;
    respond(result)
}
