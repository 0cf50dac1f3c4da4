//! Bounded worker pool running notification handlers.
//!
//! Notifications are queued on a bounded `mpsc` channel and picked up by a
//! fixed number of workers. Every unit runs in its own spawned task, so an
//! error or a panic is captured and reported as an
//! [`EventlogNotice::Failed`] without touching any other unit.

use std::sync::{Arc, RwLock};

use chrono::Utc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

use super::handlers::{EntityChange, EventlogHandlers};
use crate::domain::{EventlogNotice, OutcomeBus};
use crate::error::EventlogError;

type SharedQueue = Arc<Mutex<mpsc::Receiver<EntityChange>>>;

/// Queues notifications and runs them on a fixed set of workers.
#[derive(Debug)]
pub struct EventlogDispatcher {
    /// `None` once shut down. Sends and the close take the same lock, so
    /// every accepted notification is queued before the channel closes.
    sender: RwLock<Option<mpsc::Sender<EntityChange>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    outcomes: OutcomeBus,
}

impl EventlogDispatcher {
    /// Starts `worker_count` workers over a queue of `capacity` slots.
    ///
    /// Both values are clamped to at least one. Must be called from within
    /// a Tokio runtime.
    #[must_use]
    pub fn start(
        handlers: EventlogHandlers,
        outcomes: OutcomeBus,
        worker_count: usize,
        capacity: usize,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let queue: SharedQueue = Arc::new(Mutex::new(receiver));

        let workers = (0..worker_count.max(1))
            .map(|worker_id| {
                tokio::spawn(run_worker(
                    worker_id,
                    handlers.clone(),
                    Arc::clone(&queue),
                    outcomes.clone(),
                ))
            })
            .collect();

        tracing::info!(workers = worker_count.max(1), capacity = capacity.max(1), "dispatcher started");

        Self {
            sender: RwLock::new(Some(sender)),
            workers: Mutex::new(workers),
            outcomes,
        }
    }

    /// Queues one notification without waiting for a free slot.
    ///
    /// # Errors
    ///
    /// Returns [`EventlogError::QueueFull`] when every slot is taken and
    /// [`EventlogError::DispatcherClosed`] after [`Self::shutdown`].
    pub fn submit(&self, change: EntityChange) -> Result<(), EventlogError> {
        let guard = self
            .sender
            .read()
            .map_err(|_| EventlogError::DispatcherClosed)?;
        let Some(sender) = guard.as_ref() else {
            return Err(EventlogError::DispatcherClosed);
        };
        sender.try_send(change).map_err(|e| match e {
            TrySendError::Full(_) => EventlogError::QueueFull,
            TrySendError::Closed(_) => EventlogError::DispatcherClosed,
        })
    }

    /// Returns the bus outcome notices are published on.
    #[must_use]
    pub fn outcomes(&self) -> &OutcomeBus {
        &self.outcomes
    }

    /// Stops accepting work, lets the workers drain the queue and waits
    /// for them to exit. Calling it again is a no-op.
    pub async fn shutdown(&self) {
        let sender = match self.sender.write() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if sender.is_none() {
            return;
        }
        drop(sender);

        let workers = std::mem::take(&mut *self.workers.lock().await);
        for worker in workers {
            if let Err(e) = worker.await {
                tracing::error!(error = %e, "dispatcher worker aborted");
            }
        }
        tracing::info!("dispatcher stopped");
    }
}

/// Processes notifications until the queue is closed and empty.
async fn run_worker(
    worker_id: usize,
    handlers: EventlogHandlers,
    queue: SharedQueue,
    outcomes: OutcomeBus,
) {
    loop {
        let next = queue.lock().await.recv().await;
        let Some(change) = next else {
            break;
        };
        process(&handlers, change, &outcomes).await;
    }
    tracing::debug!(worker_id, "dispatcher worker drained");
}

async fn process(handlers: &EventlogHandlers, change: EntityChange, outcomes: &OutcomeBus) {
    let guild_id = change.guild_id().to_string();
    let target_id = change.target_id().to_string();
    let action = change.action_type();

    let unit = handlers.clone();
    let result = tokio::spawn(async move { unit.handle(&change).await }).await;

    let notice = match result {
        Ok(Ok(true)) => EventlogNotice::Recorded {
            guild_id,
            action,
            target_id,
            timestamp: Utc::now(),
        },
        Ok(Ok(false)) => EventlogNotice::Suppressed {
            guild_id,
            action,
            timestamp: Utc::now(),
        },
        Ok(Err(e)) => {
            tracing::error!(%guild_id, %action, %target_id, error = %e, "eventlog handler failed");
            EventlogNotice::Failed {
                guild_id,
                action,
                error: e.to_string(),
                timestamp: Utc::now(),
            }
        }
        Err(e) => {
            tracing::error!(%guild_id, %action, %target_id, error = %e, "eventlog handler panicked");
            EventlogNotice::Failed {
                guild_id,
                action,
                error: format!("handler panicked: {e}"),
                timestamp: Utc::now(),
            }
        }
    };
    outcomes.publish(notice);
}
