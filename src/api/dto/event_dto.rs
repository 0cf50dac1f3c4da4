//! Event record DTOs for the query endpoints.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::common_dto::{ChangeDto, OptionDto};
use crate::domain::{AttributionState, EventRecord};

/// One posted rendering of a record.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DisplayRefDto {
    /// Surface (channel) id.
    pub surface_id: String,
    /// Message id on that surface.
    pub message_id: String,
}

/// A stored event record.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EventRecordDto {
    /// Record identifier.
    pub id: uuid::Uuid,
    /// When the event happened.
    pub created_at: DateTime<Utc>,
    /// Owning guild.
    pub guild_id: String,
    /// Entity the event is about.
    pub target_id: String,
    /// `user`, `channel`, `role`, `guild` or `emoji`.
    pub target_type: String,
    /// Acting user; empty until attributed.
    pub user_id: String,
    /// Event kind, e.g. `role_update`.
    pub action_type: String,
    /// Reason, possibly empty.
    pub reason: String,
    /// Changed fields.
    pub changes: Vec<ChangeDto>,
    /// Context entries.
    pub options: Vec<OptionDto>,
    /// Whether delayed attribution is still expected.
    pub waiting_for_backfill: bool,
    /// `waiting`, `unattributed` or `attributed`.
    pub attribution: String,
    /// Posted renderings.
    pub display_refs: Vec<DisplayRefDto>,
}

impl From<EventRecord> for EventRecordDto {
    fn from(record: EventRecord) -> Self {
        let attribution = match record.attribution_state() {
            AttributionState::Waiting => "waiting",
            AttributionState::Unattributed => "unattributed",
            AttributionState::Attributed => "attributed",
        };
        Self {
            id: *record.id.as_uuid(),
            created_at: record.created_at,
            guild_id: record.guild_id,
            target_id: record.target_id,
            target_type: record.target_type.as_str().to_string(),
            user_id: record.user_id,
            action_type: record.action_type.as_str().to_string(),
            reason: record.reason,
            changes: record.changes.into_iter().map(ChangeDto::from).collect(),
            options: record.options.into_iter().map(OptionDto::from).collect(),
            waiting_for_backfill: record.waiting_for_backfill,
            attribution: attribution.to_string(),
            display_refs: record
                .display_refs
                .into_iter()
                .map(|r| DisplayRefDto {
                    surface_id: r.surface_id,
                    message_id: r.message_id,
                })
                .collect(),
        }
    }
}

/// Response body for `GET /guilds/{guild_id}/events`.
#[derive(Debug, Serialize, ToSchema)]
pub struct EventListResponse {
    /// Records, newest first.
    pub data: Vec<EventRecordDto>,
    /// Number of records returned.
    pub count: usize,
}
