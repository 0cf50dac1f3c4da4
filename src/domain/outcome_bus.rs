//! Broadcast channel for outcome notices.
//!
//! [`OutcomeBus`] wraps a [`tokio::sync::broadcast`] channel. Workers and
//! the reconciler publish an [`EventlogNotice`] for every unit of work so
//! failures inside isolated tasks stay observable.
//! [`OutcomeBus::watch_failures`] keeps a per-guild failure count for the
//! lifetime of the process.

use std::collections::BTreeMap;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use super::EventlogNotice;

/// Broadcast bus for [`EventlogNotice`]s.
///
/// When the ring buffer is full, the oldest notices are dropped for
/// lagging receivers.
#[derive(Debug, Clone)]
pub struct OutcomeBus {
    sender: broadcast::Sender<EventlogNotice>,
}

impl OutcomeBus {
    /// Creates a new `OutcomeBus` with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes a notice to all subscribers.
    ///
    /// Returns the number of receivers that received it. Without active
    /// receivers the notice is silently dropped.
    pub fn publish(&self, notice: EventlogNotice) -> usize {
        self.sender.send(notice).unwrap_or(0)
    }

    /// Creates a receiver for all future notices.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<EventlogNotice> {
        self.sender.subscribe()
    }

    /// Returns the current number of active receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Counts [`EventlogNotice::Failed`] notices per guild until `shutdown`
    /// fires or the bus closes, then logs a summary and returns the tally.
    ///
    /// The subscription starts before this returns. Notices still buffered
    /// when `shutdown` fires are counted first.
    pub fn watch_failures(&self, mut shutdown: broadcast::Receiver<()>) -> JoinHandle<FailureTally> {
        let mut notices = self.subscribe();
        tokio::spawn(async move {
            let mut tally = FailureTally::default();
            loop {
                tokio::select! {
                    biased;
                    notice = notices.recv() => match notice {
                        Ok(EventlogNotice::Failed { guild_id, .. }) => {
                            *tally.by_guild.entry(guild_id).or_default() += 1;
                        }
                        Ok(_) => {}
                        Err(RecvError::Lagged(skipped)) => {
                            tally.skipped += skipped;
                            tracing::warn!(skipped, "failure watcher lagged, notices dropped");
                        }
                        Err(RecvError::Closed) => break,
                    },
                    _ = shutdown.recv() => break,
                }
            }
            if tally.total() > 0 || tally.skipped > 0 {
                tracing::warn!(
                    failed = tally.total(),
                    guilds = tally.by_guild.len(),
                    skipped = tally.skipped,
                    "eventlog failures since start"
                );
            }
            tally
        })
    }
}

/// Failures seen by [`OutcomeBus::watch_failures`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailureTally {
    /// Failed units per guild.
    pub by_guild: BTreeMap<String, usize>,
    /// Notices lost because the watcher fell behind.
    pub skipped: u64,
}

impl FailureTally {
    /// Failed units across all guilds.
    #[must_use]
    pub fn total(&self) -> usize {
        self.by_guild.values().sum()
    }
}
