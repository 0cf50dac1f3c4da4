//! System endpoints: health check and backfill kind catalog.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::domain::BackfillKind;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
}

/// `GET /health`: Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// Backfill kind info.
#[derive(Debug, Serialize, ToSchema)]
pub struct BackfillKindInfo {
    kind: &'static str,
    action_type: &'static str,
    set_name: String,
}

/// `GET /config/backfill-kinds`: List backfill kinds.
#[utoipa::path(
    get,
    path = "/config/backfill-kinds",
    tag = "System",
    summary = "List backfill kinds",
    description = "Returns every kind of delayed attribution the service can request, with the record action type it completes.",
    responses(
        (status = 200, description = "Backfill kind catalog", body = Vec<BackfillKindInfo>),
    )
)]
pub async fn backfill_kinds_handler() -> impl IntoResponse {
    let kinds: Vec<BackfillKindInfo> = BackfillKind::ALL
        .iter()
        .map(|kind| BackfillKindInfo {
            kind: kind.as_str(),
            action_type: kind.action_type().as_str(),
            set_name: kind.set_name(),
        })
        .collect();
    (StatusCode::OK, Json(kinds))
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config/backfill-kinds", get(backfill_kinds_handler))
}
