//! Event record queries.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{EventListResponse, EventRecordDto, LimitParams};
use crate::app_state::AppState;
use crate::domain::EventId;
use crate::error::{ErrorResponse, EventlogError};

/// `GET /guilds/{guild_id}/events`: Newest records of a guild.
///
/// # Errors
///
/// Returns [`EventlogError::Persistence`] if the store cannot be read.
#[utoipa::path(
    get,
    path = "/api/v1/guilds/{guild_id}/events",
    tag = "Events",
    summary = "List guild events",
    description = "Returns the newest event records of a guild, newest first.",
    params(
        ("guild_id" = String, Path, description = "Guild id"),
        LimitParams,
    ),
    responses(
        (status = 200, description = "Event records", body = EventListResponse),
        (status = 500, description = "Store unavailable", body = ErrorResponse),
    )
)]
pub async fn list_guild_events(
    State(state): State<AppState>,
    Path(guild_id): Path<String>,
    Query(params): Query<LimitParams>,
) -> Result<impl IntoResponse, EventlogError> {
    let records = state
        .store
        .list_for_guild(&guild_id, params.clamped())
        .await?;
    let data: Vec<EventRecordDto> = records.into_iter().map(EventRecordDto::from).collect();
    Ok(Json(EventListResponse {
        count: data.len(),
        data,
    }))
}

/// `GET /events/{id}`: One record.
///
/// # Errors
///
/// Returns [`EventlogError::RecordNotFound`] if no record has that id.
#[utoipa::path(
    get,
    path = "/api/v1/events/{id}",
    tag = "Events",
    summary = "Get an event record",
    description = "Returns a single event record including its attribution state and posted renderings.",
    params(
        ("id" = uuid::Uuid, Path, description = "Event record UUID"),
    ),
    responses(
        (status = 200, description = "Event record", body = EventRecordDto),
        (status = 404, description = "Record not found", body = ErrorResponse),
    )
)]
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, EventlogError> {
    let record = state.store.get(EventId::from_uuid(id)).await?;
    Ok(Json(EventRecordDto::from(record)))
}

/// Event query routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/guilds/{guild_id}/events", get(list_guild_events))
        .route("/events/{id}", get(get_event))
}
