//! Audit-log push and backfill listing DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::common_dto::OptionDto;
use crate::domain::BackfillKind;
use crate::error::EventlogError;
use crate::feed::AuditLogEntry;

/// One audit-log entry as pushed by the poller.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AuditLogEntryDto {
    /// Backfill kind, e.g. `ban_add`.
    pub kind: String,
    /// Entity the action was performed on.
    pub target_id: String,
    /// Acting user.
    pub user_id: String,
    /// Reason given by the actor.
    #[serde(default)]
    pub reason: String,
    /// When the platform logged the action.
    pub created_at: DateTime<Utc>,
    /// Extra context copied onto the record.
    #[serde(default)]
    pub options: Vec<OptionDto>,
}

impl TryFrom<AuditLogEntryDto> for AuditLogEntry {
    type Error = EventlogError;

    fn try_from(dto: AuditLogEntryDto) -> Result<Self, Self::Error> {
        if dto.target_id.is_empty() || dto.user_id.is_empty() {
            return Err(EventlogError::InvalidRequest(
                "audit log entries need target_id and user_id".to_string(),
            ));
        }
        Ok(Self {
            kind: dto.kind.parse()?,
            target_id: dto.target_id,
            user_id: dto.user_id,
            reason: dto.reason,
            created_at: dto.created_at,
            options: dto.options.into_iter().map(Into::into).collect(),
        })
    }
}

/// Request body for `POST /guilds/{guild_id}/audit-log`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AuditLogPushRequest {
    /// Entries to buffer.
    pub entries: Vec<AuditLogEntryDto>,
}

/// Response body for `POST /guilds/{guild_id}/audit-log` (202 Accepted).
#[derive(Debug, Serialize, ToSchema)]
pub struct AuditLogPushResponse {
    /// Number of entries buffered.
    pub accepted: usize,
    /// Backfill kinds queued for reconciliation.
    pub kinds: Vec<String>,
}

/// A pending backfill request.
#[derive(Debug, Serialize, ToSchema)]
pub struct PendingBackfillDto {
    /// Guild awaiting attribution.
    pub guild_id: String,
    /// Backfill kind.
    pub kind: String,
}

impl From<(String, BackfillKind)> for PendingBackfillDto {
    fn from((guild_id, kind): (String, BackfillKind)) -> Self {
        Self {
            guild_id,
            kind: kind.as_str().to_string(),
        }
    }
}

/// Response body for `GET /backfill`.
#[derive(Debug, Serialize, ToSchema)]
pub struct BackfillListResponse {
    /// Pending requests grouped by kind.
    pub data: Vec<PendingBackfillDto>,
    /// Number of pending requests.
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dto(kind: &str) -> AuditLogEntryDto {
        AuditLogEntryDto {
            kind: kind.to_string(),
            target_id: "u9".to_string(),
            user_id: "mod1".to_string(),
            reason: String::new(),
            created_at: Utc::now(),
            options: vec![OptionDto {
                key: "delete_days".to_string(),
                value: "7".to_string(),
            }],
        }
    }

    #[test]
    fn known_kind_converts() {
        let entry = AuditLogEntry::try_from(dto("ban_add"));
        assert!(matches!(entry, Ok(ref e) if e.kind == BackfillKind::BanAdd && e.options.len() == 1));
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let entry = AuditLogEntry::try_from(dto("member_update"));
        assert!(matches!(entry, Err(EventlogError::UnknownBackfillKind(_))));
    }
}
