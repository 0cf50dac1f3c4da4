//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::feed::BufferedAttributionFeed;
use crate::persistence::EventStore;
use crate::service::{BackfillQueue, EventlogDispatcher};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Worker pool accepting change notifications.
    pub dispatcher: Arc<EventlogDispatcher>,
    /// Event records, for the query endpoints.
    pub store: Arc<dyn EventStore>,
    /// Pending backfill requests.
    pub backfill: BackfillQueue,
    /// Audit-log entries pushed by the external poller.
    pub feed: Arc<BufferedAttributionFeed>,
}
