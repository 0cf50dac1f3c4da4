//! Database row model for stored event records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    ActionType, DisplayRef, EventChange, EventId, EventOption, EventRecord, TargetType,
};
use crate::error::EventlogError;

/// A row of the `eventlog_events` table.
///
/// `target_type` and `action_type` are stored as text; the JSONB columns
/// hold the ordered change, option and display-ref arrays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEventRow {
    /// Record id.
    pub id: Uuid,
    /// Event occurrence time.
    pub created_at: DateTime<Utc>,
    /// Owning guild.
    pub guild_id: String,
    /// Target entity id.
    pub target_id: String,
    /// Target type name.
    pub target_type: String,
    /// Acting user, possibly empty.
    pub user_id: String,
    /// Action type name.
    pub action_type: String,
    /// Reason, possibly empty.
    pub reason: String,
    /// Ordered changes.
    pub changes: Vec<EventChange>,
    /// Ordered options.
    pub options: Vec<EventOption>,
    /// Pending attribution flag.
    pub waiting_for_backfill: bool,
    /// Published renderings.
    pub display_refs: Vec<DisplayRef>,
}

impl TryFrom<StoredEventRow> for EventRecord {
    type Error = EventlogError;

    fn try_from(row: StoredEventRow) -> Result<Self, Self::Error> {
        let target_type = TargetType::from_name(&row.target_type).ok_or_else(|| {
            EventlogError::Persistence(format!("unknown target type {}", row.target_type))
        })?;
        let action_type = ActionType::from_name(&row.action_type).ok_or_else(|| {
            EventlogError::Persistence(format!("unknown action type {}", row.action_type))
        })?;
        Ok(Self {
            id: EventId::from_uuid(row.id),
            created_at: row.created_at,
            guild_id: row.guild_id,
            target_id: row.target_id,
            target_type,
            user_id: row.user_id,
            action_type,
            reason: row.reason,
            changes: row.changes,
            options: row.options,
            waiting_for_backfill: row.waiting_for_backfill,
            display_refs: row.display_refs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(action_type: &str) -> StoredEventRow {
        StoredEventRow {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            guild_id: "g1".to_string(),
            target_id: "c1".to_string(),
            target_type: "channel".to_string(),
            user_id: String::new(),
            action_type: action_type.to_string(),
            reason: String::new(),
            changes: vec![EventChange::new("channel_name", "a", "b")],
            options: Vec::new(),
            waiting_for_backfill: true,
            display_refs: vec![DisplayRef::new("log", "m1")],
        }
    }

    #[test]
    fn converts_known_names() {
        let record = EventRecord::try_from(row("channel_update"));
        assert!(matches!(
            record,
            Ok(EventRecord {
                action_type: ActionType::ChannelUpdate,
                target_type: TargetType::Channel,
                ..
            })
        ));
    }

    #[test]
    fn rejects_unknown_action() {
        assert!(EventRecord::try_from(row("message_pin")).is_err());
    }
}
