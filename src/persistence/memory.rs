//! In-memory event store.
//!
//! Records live in a `tokio::sync::RwLock<HashMap<…>>`. Used by tests and
//! by the binary when `PERSISTENCE_ENABLED=false`.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::EventStore;
use crate::domain::{ActionType, AttributionUpdate, EventId, EventRecord};
use crate::error::EventlogError;

/// Process-local [`EventStore`].
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    records: RwLock<HashMap<EventId, EventRecord>>,
}

impl InMemoryEventStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns `true` if the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(&self, record: &EventRecord) -> Result<EventId, EventlogError> {
        let mut map = self.records.write().await;
        if map.contains_key(&record.id) {
            return Err(EventlogError::Persistence(format!(
                "record {} already exists",
                record.id
            )));
        }
        map.insert(record.id, record.clone());
        Ok(record.id)
    }

    async fn update(
        &self,
        id: EventId,
        update: &AttributionUpdate,
    ) -> Result<EventRecord, EventlogError> {
        let mut map = self.records.write().await;
        let record = map.get_mut(&id).ok_or(EventlogError::RecordNotFound(id))?;
        record.apply_attribution(update);
        Ok(record.clone())
    }

    async fn get(&self, id: EventId) -> Result<EventRecord, EventlogError> {
        self.records
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(EventlogError::RecordNotFound(id))
    }

    async fn list_waiting(
        &self,
        guild_id: &str,
        action: ActionType,
    ) -> Result<Vec<EventRecord>, EventlogError> {
        let map = self.records.read().await;
        let mut waiting: Vec<EventRecord> = map
            .values()
            .filter(|r| r.guild_id == guild_id && r.action_type == action && r.waiting_for_backfill)
            .cloned()
            .collect();
        waiting.sort_by_key(|r| r.created_at);
        Ok(waiting)
    }

    async fn list_for_guild(
        &self,
        guild_id: &str,
        limit: usize,
    ) -> Result<Vec<EventRecord>, EventlogError> {
        let map = self.records.read().await;
        let mut records: Vec<EventRecord> = map
            .values()
            .filter(|r| r.guild_id == guild_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records.truncate(limit);
        Ok(records)
    }
}
