//! Eventlog error types with HTTP status code mapping.
//!
//! [`EventlogError`] is the central error type of the crate. Each variant
//! maps to a specific HTTP status code and structured JSON error response.
//!
//! Policy suppression (blacklisted, limited or disabled guilds) is *not* an
//! error: the sink reports it as `Ok(false)`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::EventId;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "event record not found: 5f0c…",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Crate-wide error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category          | HTTP Status                 |
/// |-----------|-------------------|-----------------------------|
/// | 1000–1999 | Validation/usage  | 400 Bad Request             |
/// | 2000–2999 | Not Found         | 404 Not Found               |
/// | 3000–3999 | Server            | 500 Internal Server Error   |
/// | 5000–5999 | Upstream          | 502 Bad Gateway / 503       |
#[derive(Debug, thiserror::Error)]
pub enum EventlogError {
    /// Event record with the given ID was not found.
    #[error("event record not found: {0}")]
    RecordNotFound(EventId),

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A backfill kind outside the known set was requested.
    ///
    /// This is a usage error, never a transient failure.
    #[error("unknown backfill kind: {0}")]
    UnknownBackfillKind(String),

    /// The backfill set store rejected a set-add or drain.
    #[error("backfill transport error: {0}")]
    BackfillTransport(String),

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// A display surface failed to publish or edit a message.
    #[error("display surface {surface_id} error: {message}")]
    DisplaySurface {
        /// Surface (channel) the call targeted.
        surface_id: String,
        /// Failure description reported by the surface.
        message: String,
    },

    /// The attribution feed could not be queried.
    #[error("attribution feed error: {0}")]
    AttributionFeed(String),

    /// The dispatcher queue is full; the notification was not accepted.
    #[error("dispatcher queue is full")]
    QueueFull,

    /// The dispatcher has been shut down.
    #[error("dispatcher is closed")]
    DispatcherClosed,

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl EventlogError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::UnknownBackfillKind(_) => 1002,
            Self::RecordNotFound(_) => 2001,
            Self::Internal(_) => 3000,
            Self::Persistence(_) => 3001,
            Self::BackfillTransport(_) => 3002,
            Self::DisplaySurface { .. } => 5001,
            Self::AttributionFeed(_) => 5002,
            Self::QueueFull => 5003,
            Self::DispatcherClosed => 5004,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::UnknownBackfillKind(_) => StatusCode::BAD_REQUEST,
            Self::RecordNotFound(_) => StatusCode::NOT_FOUND,
            Self::Persistence(_) | Self::BackfillTransport(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::DisplaySurface { .. } | Self::AttributionFeed(_) => StatusCode::BAD_GATEWAY,
            Self::QueueFull | Self::DispatcherClosed => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for EventlogError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_kind_is_distinct_from_transport() {
        let unknown = EventlogError::UnknownBackfillKind("sticker_create".to_string());
        let transport = EventlogError::BackfillTransport("connection reset".to_string());
        assert_ne!(unknown.error_code(), transport.error_code());
        assert_eq!(unknown.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(transport.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn not_found_maps_to_404() {
        let err = EventlogError::RecordNotFound(EventId::new());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.error_code(), 2001);
    }

    #[test]
    fn surface_error_message_names_surface() {
        let err = EventlogError::DisplaySurface {
            surface_id: "4410".to_string(),
            message: "missing access".to_string(),
        };
        assert!(err.to_string().contains("4410"));
    }
}
