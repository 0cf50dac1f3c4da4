//! Change notification intake.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::NotificationAccepted;
use crate::app_state::AppState;
use crate::error::{ErrorResponse, EventlogError};
use crate::service::EntityChange;

/// `POST /notifications`: Queue one change notification.
///
/// # Errors
///
/// Returns [`EventlogError::QueueFull`] when the worker queue has no free
/// slot and [`EventlogError::DispatcherClosed`] during shutdown.
#[utoipa::path(
    post,
    path = "/api/v1/notifications",
    tag = "Notifications",
    summary = "Submit a change notification",
    description = "Queues a platform change notification (channel, role, member, ban, emoji or guild change) for recording. The `type` field selects the change kind, e.g. `channel_create` or `role_update`.",
    request_body(content = serde_json::Value, description = "Tagged change notification"),
    responses(
        (status = 202, description = "Notification queued", body = NotificationAccepted),
        (status = 503, description = "Queue full or shutting down", body = ErrorResponse),
    )
)]
pub async fn submit_notification(
    State(state): State<AppState>,
    Json(change): Json<EntityChange>,
) -> Result<impl IntoResponse, EventlogError> {
    let response = NotificationAccepted {
        status: "queued".to_string(),
        guild_id: change.guild_id().to_string(),
        action: change.action_type().as_str().to_string(),
    };
    state.dispatcher.submit(change)?;
    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// Notification routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/notifications", post(submit_notification))
}
