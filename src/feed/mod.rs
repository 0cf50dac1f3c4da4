//! Attribution feed: the platform's delayed "who did it" log.
//!
//! The platform publishes audit-log entries some time after the event
//! itself was observed. The reconciler reads them through
//! [`AttributionFeed`] and copies actor and reason onto waiting records.

pub mod buffered;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{BackfillKind, EventOption};
use crate::error::EventlogError;

pub use buffered::BufferedAttributionFeed;

/// One entry of a guild's audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    /// Kind of event the entry describes.
    pub kind: BackfillKind,
    /// Entity the action was performed on.
    pub target_id: String,
    /// Acting user.
    pub user_id: String,
    /// Reason given by the actor, possibly empty.
    #[serde(default)]
    pub reason: String,
    /// When the platform logged the action.
    pub created_at: DateTime<Utc>,
    /// Extra context copied onto the record.
    #[serde(default)]
    pub options: Vec<EventOption>,
}

/// Source of audit-log entries.
#[async_trait]
pub trait AttributionFeed: Send + Sync + fmt::Debug {
    /// Recent entries of one kind for a guild, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`EventlogError::AttributionFeed`] when the feed cannot be
    /// read.
    async fn recent_entries(
        &self,
        guild_id: &str,
        kind: BackfillKind,
    ) -> Result<Vec<AuditLogEntry>, EventlogError>;

    /// Marks an entry as applied so later reads no longer return it.
    ///
    /// Consuming an entry that is not present is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`EventlogError::AttributionFeed`] when the feed cannot be
    /// updated.
    async fn consume(&self, guild_id: &str, entry: &AuditLogEntry) -> Result<(), EventlogError>;
}
