//! Backfill request queue: pending (guild, kind) attribution requests.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::BackfillKind;
use crate::error::EventlogError;
use crate::persistence::BackfillSetStore;

/// Records that a guild needs attribution for one kind of event.
///
/// Requests live in one set per kind, so enqueuing the same pair twice
/// leaves a single pending entry. All insertions, across every kind, go
/// through one critical section.
#[derive(Debug, Clone)]
pub struct BackfillQueue {
    sets: Arc<dyn BackfillSetStore>,
    insert_lock: Arc<Mutex<()>>,
}

impl BackfillQueue {
    /// Creates a queue over a set store.
    #[must_use]
    pub fn new(sets: Arc<dyn BackfillSetStore>) -> Self {
        Self {
            sets,
            insert_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Requests attribution of `kind` events for `guild_id`.
    ///
    /// # Errors
    ///
    /// Returns [`EventlogError::BackfillTransport`] when the set store
    /// rejects the insertion.
    pub async fn enqueue(&self, guild_id: &str, kind: BackfillKind) -> Result<(), EventlogError> {
        let _guard = self.insert_lock.lock().await;
        let added = self.sets.add(&kind.set_name(), guild_id).await?;
        tracing::debug!(%guild_id, %kind, added, "backfill requested");
        Ok(())
    }

    /// Like [`Self::enqueue`] with the kind given by name.
    ///
    /// # Errors
    ///
    /// Returns [`EventlogError::UnknownBackfillKind`] for a name outside the
    /// known kinds, and [`EventlogError::BackfillTransport`] when the set
    /// store rejects the insertion.
    pub async fn enqueue_named(&self, guild_id: &str, kind: &str) -> Result<(), EventlogError> {
        let kind = kind.parse::<BackfillKind>()?;
        self.enqueue(guild_id, kind).await
    }

    /// Removes and returns every guild with a pending request of `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`EventlogError::BackfillTransport`] when the set store
    /// cannot be read.
    pub async fn drain(&self, kind: BackfillKind) -> Result<Vec<String>, EventlogError> {
        self.sets.drain(&kind.set_name()).await
    }

    /// Every pending request, grouped by kind in drain order.
    ///
    /// # Errors
    ///
    /// Returns [`EventlogError::BackfillTransport`] when the set store
    /// cannot be read.
    pub async fn pending(&self) -> Result<Vec<(String, BackfillKind)>, EventlogError> {
        let mut pending = Vec::new();
        for kind in BackfillKind::ALL {
            for guild_id in self.sets.members(&kind.set_name()).await? {
                pending.push((guild_id, kind));
            }
        }
        Ok(pending)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::persistence::InMemoryBackfillSets;

    fn queue() -> BackfillQueue {
        BackfillQueue::new(Arc::new(InMemoryBackfillSets::new()))
    }

    #[derive(Debug)]
    struct OfflineSets;

    #[async_trait]
    impl BackfillSetStore for OfflineSets {
        async fn add(&self, _set: &str, _member: &str) -> Result<bool, EventlogError> {
            Err(EventlogError::BackfillTransport("connection refused".to_string()))
        }

        async fn drain(&self, _set: &str) -> Result<Vec<String>, EventlogError> {
            Err(EventlogError::BackfillTransport("connection refused".to_string()))
        }

        async fn members(&self, _set: &str) -> Result<Vec<String>, EventlogError> {
            Err(EventlogError::BackfillTransport("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn concurrent_enqueues_collapse() {
        let queue = queue();
        let tasks: Vec<_> = (0..32)
            .map(|_| {
                let queue = queue.clone();
                tokio::spawn(async move { queue.enqueue("g1", BackfillKind::RoleCreate).await })
            })
            .collect();
        for task in tasks {
            assert!(matches!(task.await, Ok(Ok(()))));
        }
        assert_eq!(
            queue.pending().await.ok(),
            Some(vec![("g1".to_string(), BackfillKind::RoleCreate)])
        );
    }

    #[tokio::test]
    async fn kinds_are_tracked_separately() {
        let queue = queue();
        let _ = queue.enqueue("g1", BackfillKind::BanAdd).await;
        let _ = queue.enqueue("g1", BackfillKind::BanRemove).await;
        assert_eq!(queue.pending().await.map(|p| p.len()).ok(), Some(2));
        assert_eq!(
            queue.drain(BackfillKind::BanAdd).await.ok(),
            Some(vec!["g1".to_string()])
        );
        assert_eq!(queue.pending().await.map(|p| p.len()).ok(), Some(1));
    }

    #[tokio::test]
    async fn unknown_kind_differs_from_transport_failure() {
        let queue = queue();
        let unknown = queue.enqueue_named("g1", "member_update").await;
        assert!(matches!(unknown, Err(EventlogError::UnknownBackfillKind(_))));

        let offline = BackfillQueue::new(Arc::new(OfflineSets));
        let failed = offline.enqueue_named("g1", "role_create").await;
        assert!(matches!(failed, Err(EventlogError::BackfillTransport(_))));
    }

    #[tokio::test]
    async fn separate_queues_are_isolated() {
        let a = queue();
        let b = queue();
        let _ = a.enqueue("g1", BackfillKind::GuildUpdate).await;
        assert_eq!(b.pending().await.ok(), Some(Vec::new()));
    }
}
