//! Wiring of the full service from its configuration.
//!
//! [`EventlogRuntime`] builds every collaborator, the dispatcher and the
//! reconciler, and exposes the Axum router over them. The binary and the
//! HTTP integration tests share it.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::api;
use crate::app_state::AppState;
use crate::config::EventlogConfig;
use crate::display::{DisplaySurface, TracingSurface};
use crate::domain::{FailureTally, OutcomeBus};
use crate::feed::{AttributionFeed, BufferedAttributionFeed};
use crate::guild::{CachedUserDirectory, StaticGuildSettings};
use crate::persistence::{EventStore, InMemoryBackfillSets};
use crate::service::{
    BackfillQueue, BackfillReconciler, EventSink, EventlogDispatcher, EventlogHandlers,
};

/// A fully wired eventlog service.
#[derive(Debug)]
pub struct EventlogRuntime {
    state: AppState,
    outcomes: OutcomeBus,
    reconciler: BackfillReconciler,
    poll_interval: Duration,
    shutdown: broadcast::Sender<()>,
}

impl EventlogRuntime {
    /// Wires the service over `store`, rendering to the log.
    ///
    /// Starts the dispatcher workers, so it must be called from within a
    /// Tokio runtime.
    #[must_use]
    pub fn build(config: &EventlogConfig, store: Arc<dyn EventStore>) -> Self {
        Self::build_with_surface(config, store, Arc::new(TracingSurface::new()))
    }

    /// Like [`Self::build`] with a custom display surface.
    #[must_use]
    pub fn build_with_surface(
        config: &EventlogConfig,
        store: Arc<dyn EventStore>,
        surface: Arc<dyn DisplaySurface>,
    ) -> Self {
        let outcomes = OutcomeBus::new(config.outcome_bus_capacity);
        let users = Arc::new(CachedUserDirectory::new());
        let feed = Arc::new(BufferedAttributionFeed::new(config.feed_capacity));
        let backfill = BackfillQueue::new(Arc::new(InMemoryBackfillSets::new()));

        let sink = EventSink::new(
            Arc::new(StaticGuildSettings::from_config(config)),
            Arc::clone(&store),
            surface,
            Arc::clone(&users) as Arc<dyn crate::guild::UserDirectory>,
        );
        let handlers =
            EventlogHandlers::new(sink.clone(), backfill.clone()).with_user_cache(users);
        let dispatcher = EventlogDispatcher::start(
            handlers,
            outcomes.clone(),
            config.worker_count,
            config.worker_queue_capacity,
        );
        let reconciler = BackfillReconciler::new(
            backfill.clone(),
            Arc::clone(&feed) as Arc<dyn AttributionFeed>,
            sink,
            outcomes.clone(),
            Duration::from_secs(config.backfill_match_window_secs),
        );
        let (shutdown, _) = broadcast::channel(1);

        Self {
            state: AppState {
                dispatcher: Arc::new(dispatcher),
                store,
                backfill,
                feed,
            },
            outcomes,
            reconciler,
            poll_interval: Duration::from_secs(config.backfill_poll_interval_secs.max(1)),
            shutdown,
        }
    }

    /// Shared handler state.
    #[must_use]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Bus every unit of work reports its outcome on.
    #[must_use]
    pub fn outcomes(&self) -> &OutcomeBus {
        &self.outcomes
    }

    /// The backfill reconciler, for running passes on demand.
    #[must_use]
    pub fn reconciler(&self) -> &BackfillReconciler {
        &self.reconciler
    }

    /// The API router bound to this runtime's state.
    pub fn router(&self) -> Router {
        api::build_router().with_state(self.state.clone())
    }

    /// Starts the periodic reconciler; it stops on [`Self::shutdown`].
    pub fn spawn_reconciler(&self) -> JoinHandle<()> {
        let reconciler = self.reconciler.clone();
        let interval = self.poll_interval;
        let shutdown = self.shutdown.subscribe();
        tokio::spawn(async move { reconciler.run(interval, shutdown).await })
    }

    /// Starts counting failed units; the tally is returned after
    /// [`Self::shutdown`].
    pub fn spawn_failure_watch(&self) -> JoinHandle<FailureTally> {
        self.outcomes.watch_failures(self.shutdown.subscribe())
    }

    /// Drains the dispatcher, then stops the reconciler and the failure
    /// watch.
    pub async fn shutdown(&self) {
        self.state.dispatcher.shutdown().await;
        let _ = self.shutdown.send(());
    }
}
