//! Audit-log intake and pending backfill listing.

use std::collections::BTreeSet;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    AuditLogPushRequest, AuditLogPushResponse, BackfillListResponse, PendingBackfillDto,
};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, EventlogError};
use crate::feed::AuditLogEntry;

/// `POST /guilds/{guild_id}/audit-log`: Buffer audit-log entries.
///
/// Every kind present in the batch is queued for reconciliation, so
/// entries that arrive after a pass still get matched.
///
/// # Errors
///
/// Returns [`EventlogError::UnknownBackfillKind`] or
/// [`EventlogError::InvalidRequest`] for a malformed entry (nothing is
/// buffered then), and [`EventlogError::BackfillTransport`] if a request
/// could not be queued.
#[utoipa::path(
    post,
    path = "/api/v1/guilds/{guild_id}/audit-log",
    tag = "Backfill",
    summary = "Push audit-log entries",
    description = "Buffers the guild's recent audit-log entries for the backfill reconciler and queues reconciliation for every kind in the batch.",
    params(
        ("guild_id" = String, Path, description = "Guild id"),
    ),
    request_body = AuditLogPushRequest,
    responses(
        (status = 202, description = "Entries buffered", body = AuditLogPushResponse),
        (status = 400, description = "Malformed entry or unknown kind", body = ErrorResponse),
    )
)]
pub async fn push_audit_log(
    State(state): State<AppState>,
    Path(guild_id): Path<String>,
    Json(req): Json<AuditLogPushRequest>,
) -> Result<impl IntoResponse, EventlogError> {
    let entries = req
        .entries
        .into_iter()
        .map(AuditLogEntry::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    let kinds: BTreeSet<_> = entries.iter().map(|entry| entry.kind).collect();
    let accepted = entries.len();

    state.feed.push(&guild_id, entries).await;
    for kind in &kinds {
        state.backfill.enqueue(&guild_id, *kind).await?;
    }

    tracing::debug!(%guild_id, accepted, "audit log entries buffered");
    Ok((
        StatusCode::ACCEPTED,
        Json(AuditLogPushResponse {
            accepted,
            kinds: kinds.iter().map(|k| k.as_str().to_string()).collect(),
        }),
    ))
}

/// `GET /backfill`: Pending backfill requests.
///
/// # Errors
///
/// Returns [`EventlogError::BackfillTransport`] if the set store cannot be
/// read.
#[utoipa::path(
    get,
    path = "/api/v1/backfill",
    tag = "Backfill",
    summary = "List pending backfill requests",
    description = "Returns every (guild, kind) pair awaiting the next reconciliation pass.",
    responses(
        (status = 200, description = "Pending requests", body = BackfillListResponse),
    )
)]
pub async fn list_backfill(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, EventlogError> {
    let data: Vec<PendingBackfillDto> = state
        .backfill
        .pending()
        .await?
        .into_iter()
        .map(PendingBackfillDto::from)
        .collect();
    Ok(Json(BackfillListResponse {
        count: data.len(),
        data,
    }))
}

/// Backfill routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/guilds/{guild_id}/audit-log", post(push_audit_log))
        .route("/backfill", get(list_backfill))
}
