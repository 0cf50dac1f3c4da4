//! REST API layer: route handlers, DTOs, and router composition.
//!
//! All resource endpoints are mounted under `/api/v1`; the health check and
//! the backfill kind catalog live at the root. With the `swagger-ui`
//! feature the OpenAPI document is served at `/api-docs/openapi.json` and
//! browsable at `/swagger-ui`.

pub mod dto;
pub mod handlers;

use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI description of every endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "guild-eventlog",
        description = "Guild audit trail: change notifications, event records and attribution backfill."
    ),
    paths(
        handlers::system::health_handler,
        handlers::system::backfill_kinds_handler,
        handlers::notifications::submit_notification,
        handlers::events::list_guild_events,
        handlers::events::get_event,
        handlers::backfill::push_audit_log,
        handlers::backfill::list_backfill,
    ),
    components(schemas(
        crate::error::ErrorResponse,
        crate::error::ErrorBody,
        dto::NotificationAccepted,
        dto::EventRecordDto,
        dto::EventListResponse,
        dto::AuditLogPushRequest,
        dto::AuditLogPushResponse,
        dto::BackfillListResponse,
    )),
    tags(
        (name = "System", description = "Health and catalog"),
        (name = "Notifications", description = "Change notification intake"),
        (name = "Events", description = "Event record queries"),
        (name = "Backfill", description = "Delayed attribution"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
}

/// Wraps a router with request tracing, a request timeout and permissive
/// CORS.
///
/// Requests running longer than `request_timeout` are answered with
/// `408 Request Timeout`.
pub fn with_middleware(router: Router, request_timeout: Duration) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                request_timeout,
            ))
            .layer(CorsLayer::permissive()),
    )
}
