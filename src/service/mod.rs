//! Service layer: recording, backfill and dispatch orchestration.
//!
//! [`EventSink`] turns a [`crate::domain::NewEventRecord`] into a stored,
//! posted record. [`EventlogHandlers`] maps each platform notification to
//! one sink call plus a [`BackfillQueue`] request, [`EventlogDispatcher`]
//! runs those handlers on a bounded worker pool, and [`BackfillReconciler`]
//! later completes attribution from the audit-log feed.

pub mod backfill_queue;
pub mod dispatcher;
pub mod event_sink;
pub mod handlers;
pub mod reconciler;

#[cfg(test)]
mod test_support;

pub use backfill_queue::BackfillQueue;
pub use dispatcher::EventlogDispatcher;
pub use event_sink::EventSink;
pub use handlers::{EntityChange, EventlogHandlers};
pub use reconciler::{BackfillReconciler, ReconcileReport};
