//! Notification submission DTOs.

use serde::Serialize;
use utoipa::ToSchema;

/// Response body for `POST /notifications` (202 Accepted).
#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationAccepted {
    /// Always `"queued"`.
    pub status: String,
    /// Guild the notification belongs to.
    pub guild_id: String,
    /// Action type the notification will be recorded as.
    pub action: String,
}
