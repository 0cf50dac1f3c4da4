//! Outcome notices emitted by the dispatcher and the reconciler.
//!
//! Every unit of work ends in exactly one [`EventlogNotice`] published on
//! the [`super::OutcomeBus`]. Notices are observability only; nothing in
//! the engine depends on them being received.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{ActionType, EventId};

/// Outcome of one unit of eventlog work.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "notice_type", rename_all = "snake_case")]
pub enum EventlogNotice {
    /// A record was persisted.
    Recorded {
        /// Owning guild.
        guild_id: String,
        /// Kind of event.
        action: ActionType,
        /// Entity the event is about.
        target_id: String,
        /// When the notice was emitted.
        timestamp: DateTime<Utc>,
    },

    /// A policy check skipped the event.
    Suppressed {
        /// Guild the event belonged to (possibly empty).
        guild_id: String,
        /// Kind of event.
        action: ActionType,
        /// When the notice was emitted.
        timestamp: DateTime<Utc>,
    },

    /// Handling failed or panicked.
    Failed {
        /// Guild the event belonged to.
        guild_id: String,
        /// Kind of event.
        action: ActionType,
        /// Error or panic description.
        error: String,
        /// When the notice was emitted.
        timestamp: DateTime<Utc>,
    },

    /// The reconciler attributed a pending record.
    Attributed {
        /// Updated record.
        event_id: EventId,
        /// Owning guild.
        guild_id: String,
        /// Actor resolved by the feed.
        user_id: String,
        /// When the notice was emitted.
        timestamp: DateTime<Utc>,
    },
}

impl EventlogNotice {
    /// Returns the guild the notice concerns.
    #[must_use]
    pub fn guild_id(&self) -> &str {
        match self {
            Self::Recorded { guild_id, .. }
            | Self::Suppressed { guild_id, .. }
            | Self::Failed { guild_id, .. }
            | Self::Attributed { guild_id, .. } => guild_id,
        }
    }

    /// Returns the notice type as a static string slice.
    #[must_use]
    pub const fn notice_type_str(&self) -> &'static str {
        match self {
            Self::Recorded { .. } => "recorded",
            Self::Suppressed { .. } => "suppressed",
            Self::Failed { .. } => "failed",
            Self::Attributed { .. } => "attributed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_notice_serializes_with_tag() {
        let notice = EventlogNotice::Failed {
            guild_id: "g1".to_string(),
            action: ActionType::RoleUpdate,
            error: "persistence error: timeout".to_string(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&notice).unwrap_or_default();
        assert!(json.contains("\"notice_type\":\"failed\""));
        assert!(json.contains("role_update"));
        assert_eq!(notice.guild_id(), "g1");
    }

    #[test]
    fn attributed_notice_type() {
        let notice = EventlogNotice::Attributed {
            event_id: EventId::new(),
            guild_id: "g2".to_string(),
            user_id: "u9".to_string(),
            timestamp: Utc::now(),
        };
        assert_eq!(notice.notice_type_str(), "attributed");
    }
}
