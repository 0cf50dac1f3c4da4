//! Attribution feed filled by an external poller.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{AttributionFeed, AuditLogEntry};
use crate::domain::BackfillKind;
use crate::error::EventlogError;

/// Entries kept per guild when no capacity is given.
pub const DEFAULT_CAPACITY: usize = 100;

/// [`AttributionFeed`] holding the most recent pushed entries per guild.
///
/// Entries stay readable until newer ones push them out or the
/// reconciler consumes them.
#[derive(Debug)]
pub struct BufferedAttributionFeed {
    capacity: usize,
    entries: RwLock<HashMap<String, VecDeque<AuditLogEntry>>>,
}

impl Default for BufferedAttributionFeed {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl BufferedAttributionFeed {
    /// Creates a feed keeping at most `capacity` entries per guild.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Appends entries for a guild, evicting the oldest beyond capacity.
    pub async fn push(&self, guild_id: &str, entries: impl IntoIterator<Item = AuditLogEntry>) {
        let mut all = self.entries.write().await;
        let buffer = all.entry(guild_id.to_string()).or_default();
        for entry in entries {
            buffer.push_back(entry);
        }
        while buffer.len() > self.capacity {
            buffer.pop_front();
        }
    }
}

#[async_trait]
impl AttributionFeed for BufferedAttributionFeed {
    async fn recent_entries(
        &self,
        guild_id: &str,
        kind: BackfillKind,
    ) -> Result<Vec<AuditLogEntry>, EventlogError> {
        let all = self.entries.read().await;
        let mut entries: Vec<AuditLogEntry> = all
            .get(guild_id)
            .map(|buffer| {
                buffer
                    .iter()
                    .filter(|entry| entry.kind == kind)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }

    async fn consume(&self, guild_id: &str, entry: &AuditLogEntry) -> Result<(), EventlogError> {
        let mut all = self.entries.write().await;
        if let Some(buffer) = all.get_mut(guild_id)
            && let Some(index) = buffer.iter().position(|buffered| buffered == entry)
        {
            buffer.remove(index);
        }
        Ok(())
    }
}
