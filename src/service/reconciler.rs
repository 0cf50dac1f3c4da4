//! Backfill reconciler: attributes waiting records from the audit log.
//!
//! Each poll drains every kind's pending guilds, reads the guild's recent
//! audit-log entries of that kind and copies actor and reason onto the
//! records still waiting for them.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast;

use super::{BackfillQueue, EventSink};
use crate::domain::{AttributionUpdate, BackfillKind, EventRecord, EventlogNotice, OutcomeBus};
use crate::error::EventlogError;
use crate::feed::{AttributionFeed, AuditLogEntry};

/// Totals of one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// (guild, kind) requests drained.
    pub requests: usize,
    /// Records attributed.
    pub attributed: usize,
    /// Requests put back for the next pass after a failure.
    pub requeued: usize,
}

/// Matches waiting records against the attribution feed.
///
/// A request whose feed or store call fails is re-enqueued and retried
/// on the next pass. Once the feed answered, the request is consumed even
/// if some records found no matching entry; those stay waiting. Applied
/// entries are consumed from the feed so no later pass reuses them.
#[derive(Debug, Clone)]
pub struct BackfillReconciler {
    queue: BackfillQueue,
    feed: Arc<dyn AttributionFeed>,
    sink: EventSink,
    outcomes: OutcomeBus,
    match_window: chrono::Duration,
}

impl BackfillReconciler {
    /// Creates a reconciler.
    ///
    /// An entry matches a record when both name the same target and their
    /// timestamps are at most `match_window` apart.
    #[must_use]
    pub fn new(
        queue: BackfillQueue,
        feed: Arc<dyn AttributionFeed>,
        sink: EventSink,
        outcomes: OutcomeBus,
        match_window: Duration,
    ) -> Self {
        Self {
            queue,
            feed,
            sink,
            outcomes,
            match_window: chrono::Duration::from_std(match_window)
                .unwrap_or(chrono::Duration::MAX),
        }
    }

    /// Runs one pass over every backfill kind.
    ///
    /// # Errors
    ///
    /// Returns [`EventlogError::BackfillTransport`] if a kind's pending set
    /// cannot be drained. Per-guild failures are re-enqueued instead.
    pub async fn run_once(&self) -> Result<ReconcileReport, EventlogError> {
        let mut report = ReconcileReport::default();
        for kind in BackfillKind::ALL {
            for guild_id in self.queue.drain(kind).await? {
                report.requests += 1;
                match self.reconcile(&guild_id, kind).await {
                    Ok(attributed) => report.attributed += attributed,
                    Err(e) => {
                        tracing::warn!(%guild_id, %kind, error = %e, "backfill failed, retrying next poll");
                        if let Err(e) = self.queue.enqueue(&guild_id, kind).await {
                            tracing::error!(%guild_id, %kind, error = %e, "failed to re-enqueue backfill");
                        } else {
                            report.requeued += 1;
                        }
                    }
                }
            }
        }
        if report.requests > 0 {
            tracing::info!(
                requests = report.requests,
                attributed = report.attributed,
                requeued = report.requeued,
                "backfill pass finished"
            );
        }
        Ok(report)
    }

    /// Calls [`Self::run_once`] every `interval` until `shutdown` fires.
    pub async fn run(&self, interval: Duration, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("backfill reconciler stopped");
                    return;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.run_once().await {
                        tracing::error!(error = %e, "backfill pass aborted");
                    }
                }
            }
        }
    }

    async fn reconcile(&self, guild_id: &str, kind: BackfillKind) -> Result<usize, EventlogError> {
        let entries = self.feed.recent_entries(guild_id, kind).await?;
        let waiting = self
            .sink
            .store()
            .list_waiting(guild_id, kind.action_type())
            .await?;

        let mut attributed = 0;
        for (record, entry) in self.assign(&waiting, &entries) {
            let update = AttributionUpdate {
                user_id: entry.user_id.clone(),
                reason: entry.reason.clone(),
                options: entry.options.clone(),
                changes: Vec::new(),
                backfilled: true,
            };
            let updated = self.sink.update_attribution(record.id, update).await?;
            attributed += 1;
            if let Err(e) = self.feed.consume(guild_id, entry).await {
                tracing::error!(event_id = %record.id, %kind, error = %e, "failed to consume audit log entry");
            }
            self.outcomes.publish(EventlogNotice::Attributed {
                event_id: updated.id,
                guild_id: updated.guild_id,
                user_id: updated.user_id,
                timestamp: Utc::now(),
            });
        }
        if attributed < waiting.len() {
            tracing::debug!(%guild_id, %kind, unmatched = waiting.len() - attributed, "records left waiting");
        }
        Ok(attributed)
    }

    /// Pairs waiting records with feed entries, closest pair first.
    ///
    /// Each record and each entry appears in at most one pair. Ties keep
    /// the older record first.
    fn assign<'a>(
        &self,
        waiting: &'a [EventRecord],
        entries: &'a [AuditLogEntry],
    ) -> Vec<(&'a EventRecord, &'a AuditLogEntry)> {
        let mut candidates = Vec::new();
        for (r, record) in waiting.iter().enumerate() {
            for (e, entry) in entries.iter().enumerate() {
                if entry.target_id != record.target_id || entry.user_id.is_empty() {
                    continue;
                }
                let distance = (entry.created_at - record.created_at).abs();
                if distance <= self.match_window {
                    candidates.push((distance, r, e));
                }
            }
        }
        candidates.sort();

        let mut record_taken = vec![false; waiting.len()];
        let mut entry_taken = vec![false; entries.len()];
        let mut pairs = Vec::new();
        for (_, r, e) in candidates {
            let (Some(record_slot), Some(entry_slot)) = (record_taken.get_mut(r), entry_taken.get_mut(e))
            else {
                continue;
            };
            if *record_slot || *entry_slot {
                continue;
            }
            *record_slot = true;
            *entry_slot = true;
            if let (Some(record), Some(entry)) = (waiting.get(r), entries.get(e)) {
                pairs.push((record, entry));
            }
        }
        pairs
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use async_trait::async_trait;
    use chrono::DateTime;

    use super::*;
    use crate::display::DisplaySurface;
    use crate::domain::{ActionType, AttributionState, NewEventRecord, TargetType};
    use crate::feed::BufferedAttributionFeed;
    use crate::guild::{CachedUserDirectory, StaticGuildSettings};
    use crate::persistence::{EventStore, InMemoryBackfillSets, InMemoryEventStore};
    use crate::service::test_support::RecordingSurface;

    #[derive(Debug)]
    struct OfflineFeed;

    #[async_trait]
    impl AttributionFeed for OfflineFeed {
        async fn recent_entries(
            &self,
            _guild_id: &str,
            _kind: BackfillKind,
        ) -> Result<Vec<AuditLogEntry>, EventlogError> {
            Err(EventlogError::AttributionFeed("rate limited".to_string()))
        }

        async fn consume(&self, _guild_id: &str, _entry: &AuditLogEntry) -> Result<(), EventlogError> {
            Err(EventlogError::AttributionFeed("rate limited".to_string()))
        }
    }

    struct Fixture {
        store: Arc<InMemoryEventStore>,
        queue: BackfillQueue,
        feed: Arc<BufferedAttributionFeed>,
        surface: Arc<RecordingSurface>,
        sink: EventSink,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryEventStore::new());
        let surface = Arc::new(RecordingSurface::default());
        let sink = EventSink::new(
            Arc::new(StaticGuildSettings::new()),
            Arc::clone(&store) as Arc<dyn EventStore>,
            Arc::clone(&surface) as Arc<dyn DisplaySurface>,
            Arc::new(CachedUserDirectory::new()),
        );
        Fixture {
            store,
            queue: BackfillQueue::new(Arc::new(InMemoryBackfillSets::new())),
            feed: Arc::new(BufferedAttributionFeed::default()),
            surface,
            sink,
        }
    }

    fn reconciler(f: &Fixture, feed: Arc<dyn AttributionFeed>) -> BackfillReconciler {
        BackfillReconciler::new(
            f.queue.clone(),
            feed,
            f.sink.clone(),
            OutcomeBus::new(16),
            Duration::from_secs(30),
        )
    }

    async fn waiting_ban(f: &Fixture, target: &str, at: DateTime<Utc>) -> EventRecord {
        let record = NewEventRecord::new("g1", target, TargetType::User, ActionType::BanAdd)
            .created_at(at)
            .waiting_for_backfill(true)
            .into_record(Utc::now());
        let _ = f.store.append(&record).await;
        record
    }

    fn ban_entry(target: &str, user: &str, at: DateTime<Utc>) -> AuditLogEntry {
        AuditLogEntry {
            kind: BackfillKind::BanAdd,
            target_id: target.to_string(),
            user_id: user.to_string(),
            reason: "spam".to_string(),
            created_at: at,
            options: Vec::new(),
        }
    }

    #[tokio::test]
    async fn matching_entry_attributes_record() {
        let f = fixture();
        let now = Utc::now();
        let record = waiting_ban(&f, "u9", now).await;
        f.feed
            .push("g1", vec![ban_entry("u9", "mod1", now + chrono::Duration::seconds(2))])
            .await;
        let _ = f.queue.enqueue("g1", BackfillKind::BanAdd).await;

        let report = reconciler(&f, Arc::clone(&f.feed) as Arc<dyn AttributionFeed>)
            .run_once()
            .await;
        assert_eq!(
            report.ok(),
            Some(ReconcileReport {
                requests: 1,
                attributed: 1,
                requeued: 0
            })
        );

        let Ok(stored) = f.store.get(record.id).await else {
            panic!("record should exist");
        };
        assert_eq!(stored.user_id, "mod1");
        assert_eq!(stored.reason, "spam");
        assert_eq!(stored.attribution_state(), AttributionState::Attributed);
        assert_eq!(f.queue.pending().await.ok(), Some(Vec::new()));
    }

    #[tokio::test]
    async fn entries_outside_window_or_target_are_ignored() {
        let f = fixture();
        let now = Utc::now();
        let record = waiting_ban(&f, "u9", now).await;
        f.feed
            .push(
                "g1",
                vec![
                    ban_entry("u9", "mod1", now - chrono::Duration::minutes(10)),
                    ban_entry("u8", "mod2", now),
                ],
            )
            .await;
        let _ = f.queue.enqueue("g1", BackfillKind::BanAdd).await;

        let report = reconciler(&f, Arc::clone(&f.feed) as Arc<dyn AttributionFeed>)
            .run_once()
            .await;
        assert_eq!(report.map(|r| r.attributed).ok(), Some(0));

        let Ok(stored) = f.store.get(record.id).await else {
            panic!("record should exist");
        };
        assert_eq!(stored.attribution_state(), AttributionState::Waiting);
        // consumed even though nothing matched
        assert_eq!(f.queue.pending().await.ok(), Some(Vec::new()));
    }

    #[tokio::test]
    async fn each_entry_attributes_one_record_closest_first() {
        let f = fixture();
        let now = Utc::now();
        let first = waiting_ban(&f, "u9", now).await;
        let second = waiting_ban(&f, "u9", now + chrono::Duration::seconds(20)).await;
        f.feed
            .push("g1", vec![ban_entry("u9", "mod1", now + chrono::Duration::seconds(1))])
            .await;
        let _ = f.queue.enqueue("g1", BackfillKind::BanAdd).await;

        let _ = reconciler(&f, Arc::clone(&f.feed) as Arc<dyn AttributionFeed>)
            .run_once()
            .await;

        let (Ok(first), Ok(second)) = (f.store.get(first.id).await, f.store.get(second.id).await)
        else {
            panic!("records should exist");
        };
        assert_eq!(first.user_id, "mod1");
        assert_eq!(second.attribution_state(), AttributionState::Waiting);
    }

    #[tokio::test]
    async fn closer_later_record_wins_the_entry() {
        let f = fixture();
        let now = Utc::now();
        let first = waiting_ban(&f, "u9", now).await;
        let second = waiting_ban(&f, "u9", now + chrono::Duration::seconds(20)).await;
        f.feed
            .push("g1", vec![ban_entry("u9", "mod1", now + chrono::Duration::seconds(19))])
            .await;
        let _ = f.queue.enqueue("g1", BackfillKind::BanAdd).await;

        let report = reconciler(&f, Arc::clone(&f.feed) as Arc<dyn AttributionFeed>)
            .run_once()
            .await;
        assert_eq!(report.map(|r| r.attributed).ok(), Some(1));

        let (Ok(first), Ok(second)) = (f.store.get(first.id).await, f.store.get(second.id).await)
        else {
            panic!("records should exist");
        };
        assert_eq!(first.attribution_state(), AttributionState::Waiting);
        assert_eq!(second.user_id, "mod1");
    }

    #[tokio::test]
    async fn applied_entry_is_not_reused_on_a_later_pass() {
        let f = fixture();
        let now = Utc::now();
        let first = waiting_ban(&f, "u9", now).await;
        let second = waiting_ban(&f, "u9", now + chrono::Duration::seconds(20)).await;
        f.feed
            .push("g1", vec![ban_entry("u9", "mod1", now + chrono::Duration::seconds(1))])
            .await;
        let reconciler = reconciler(&f, Arc::clone(&f.feed) as Arc<dyn AttributionFeed>);

        let _ = f.queue.enqueue("g1", BackfillKind::BanAdd).await;
        let _ = reconciler.run_once().await;

        // an unrelated ban arrives and triggers another pass
        f.feed.push("g1", vec![ban_entry("u5", "mod2", now)]).await;
        let _ = f.queue.enqueue("g1", BackfillKind::BanAdd).await;
        let report = reconciler.run_once().await;
        assert_eq!(report.map(|r| r.attributed).ok(), Some(0));

        let (Ok(first), Ok(second)) = (f.store.get(first.id).await, f.store.get(second.id).await)
        else {
            panic!("records should exist");
        };
        assert_eq!(first.user_id, "mod1");
        assert_eq!(second.user_id, "");
        assert_eq!(second.attribution_state(), AttributionState::Waiting);
    }

    #[tokio::test]
    async fn feed_failure_requeues_request() {
        let f = fixture();
        let _ = waiting_ban(&f, "u9", Utc::now()).await;
        let _ = f.queue.enqueue("g1", BackfillKind::BanAdd).await;

        let report = reconciler(&f, Arc::new(OfflineFeed)).run_once().await;
        assert_eq!(report.map(|r| r.requeued).ok(), Some(1));
        assert_eq!(
            f.queue.pending().await.ok(),
            Some(vec![("g1".to_string(), BackfillKind::BanAdd)])
        );
    }

    #[tokio::test]
    async fn attribution_refreshes_posted_messages() {
        let f = fixture();
        let now = Utc::now();
        let mut record = NewEventRecord::new("g1", "u9", TargetType::User, ActionType::BanAdd)
            .created_at(now)
            .waiting_for_backfill(true)
            .into_record(now);
        record.add_display_ref(crate::domain::DisplayRef::new("c1", "m7"));
        let _ = f.store.append(&record).await;
        f.feed.push("g1", vec![ban_entry("u9", "mod1", now)]).await;
        let _ = f.queue.enqueue("g1", BackfillKind::BanAdd).await;

        let _ = reconciler(&f, Arc::clone(&f.feed) as Arc<dyn AttributionFeed>)
            .run_once()
            .await;
        assert_eq!(f.surface.edits().await.len(), 1);
    }

    #[tokio::test]
    async fn run_stops_on_shutdown() {
        let f = fixture();
        let reconciler = reconciler(&f, Arc::clone(&f.feed) as Arc<dyn AttributionFeed>);
        let (tx, rx) = broadcast::channel(1);
        let task = tokio::spawn(async move { reconciler.run(Duration::from_millis(10), rx).await });
        let _ = tx.send(());
        let joined = tokio::time::timeout(Duration::from_secs(5), task).await;
        assert!(matches!(joined, Ok(Ok(()))));
    }
}
