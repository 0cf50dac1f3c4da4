//! Persistence layer: event records and backfill request sets.
//!
//! [`EventStore`] is the durable append + point-update contract for
//! [`EventRecord`]s. [`BackfillSetStore`] is the set-add transport behind
//! [`crate::service::BackfillQueue`]. Each has an in-memory implementation
//! for tests and single-node runs; event records additionally have a
//! PostgreSQL implementation via `sqlx`.

pub mod backfill_sets;
pub mod memory;
pub mod models;
pub mod postgres;

use std::fmt;

use async_trait::async_trait;

use crate::domain::{ActionType, AttributionUpdate, EventId, EventRecord};
use crate::error::EventlogError;

pub use backfill_sets::{BackfillSetStore, InMemoryBackfillSets};
pub use memory::InMemoryEventStore;
pub use postgres::PostgresEventStore;

/// Durable storage for event records.
#[async_trait]
pub trait EventStore: Send + Sync + fmt::Debug {
    /// Appends a fully assembled record.
    ///
    /// # Errors
    ///
    /// Returns [`EventlogError::Persistence`] when the write fails.
    async fn append(&self, record: &EventRecord) -> Result<EventId, EventlogError>;

    /// Applies attribution fields to a stored record and returns the
    /// updated record.
    ///
    /// # Errors
    ///
    /// Returns [`EventlogError::RecordNotFound`] for an unknown id and
    /// [`EventlogError::Persistence`] when the write fails.
    async fn update(
        &self,
        id: EventId,
        update: &AttributionUpdate,
    ) -> Result<EventRecord, EventlogError>;

    /// Loads one record.
    ///
    /// # Errors
    ///
    /// Returns [`EventlogError::RecordNotFound`] for an unknown id and
    /// [`EventlogError::Persistence`] when the read fails.
    async fn get(&self, id: EventId) -> Result<EventRecord, EventlogError>;

    /// Records of a guild still waiting for attribution of one action
    /// type, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`EventlogError::Persistence`] when the read fails.
    async fn list_waiting(
        &self,
        guild_id: &str,
        action: ActionType,
    ) -> Result<Vec<EventRecord>, EventlogError>;

    /// The newest `limit` records of a guild, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`EventlogError::Persistence`] when the read fails.
    async fn list_for_guild(
        &self,
        guild_id: &str,
        limit: usize,
    ) -> Result<Vec<EventRecord>, EventlogError>;
}
