//! PostgreSQL implementation of the event store.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use uuid::Uuid;

use super::EventStore;
use super::models::StoredEventRow;
use crate::config::EventlogConfig;
use crate::domain::{
    ActionType, AttributionUpdate, DisplayRef, EventChange, EventId, EventOption, EventRecord,
};
use crate::error::EventlogError;

type EventRow = (
    Uuid,
    DateTime<Utc>,
    String,
    String,
    String,
    String,
    String,
    String,
    Json<Vec<EventChange>>,
    Json<Vec<EventOption>>,
    bool,
    Json<Vec<DisplayRef>>,
);

const SELECT_COLUMNS: &str = "SELECT id, created_at, guild_id, target_id, target_type, user_id, \
     action_type, reason, changes, options, waiting_for_backfill, display_refs \
     FROM eventlog_events";

/// PostgreSQL-backed [`EventStore`] using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresEventStore {
    pool: PgPool,
}

impl PostgresEventStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects with the configured pool limits and runs pending
    /// migrations.
    ///
    /// # Errors
    ///
    /// Returns [`EventlogError::Persistence`] if the database is
    /// unreachable or a migration fails.
    pub async fn connect(config: &EventlogConfig) -> Result<Self, EventlogError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await
            .map_err(|e| EventlogError::Persistence(e.to_string()))?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| EventlogError::Persistence(e.to_string()))?;

        Ok(Self::new(pool))
    }
}

fn into_record(row: EventRow) -> Result<EventRecord, EventlogError> {
    let (
        id,
        created_at,
        guild_id,
        target_id,
        target_type,
        user_id,
        action_type,
        reason,
        changes,
        options,
        waiting_for_backfill,
        display_refs,
    ) = row;
    EventRecord::try_from(StoredEventRow {
        id,
        created_at,
        guild_id,
        target_id,
        target_type,
        user_id,
        action_type,
        reason,
        changes: changes.0,
        options: options.0,
        waiting_for_backfill,
        display_refs: display_refs.0,
    })
}

#[async_trait]
impl EventStore for PostgresEventStore {
    async fn append(&self, record: &EventRecord) -> Result<EventId, EventlogError> {
        sqlx::query(
            "INSERT INTO eventlog_events (id, created_at, guild_id, target_id, target_type, \
             user_id, action_type, reason, changes, options, waiting_for_backfill, display_refs) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(*record.id.as_uuid())
        .bind(record.created_at)
        .bind(&record.guild_id)
        .bind(&record.target_id)
        .bind(record.target_type.as_str())
        .bind(&record.user_id)
        .bind(record.action_type.as_str())
        .bind(&record.reason)
        .bind(Json(&record.changes))
        .bind(Json(&record.options))
        .bind(record.waiting_for_backfill)
        .bind(Json(&record.display_refs))
        .execute(&self.pool)
        .await
        .map_err(|e| EventlogError::Persistence(e.to_string()))?;

        Ok(record.id)
    }

    async fn update(
        &self,
        id: EventId,
        update: &AttributionUpdate,
    ) -> Result<EventRecord, EventlogError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| EventlogError::Persistence(e.to_string()))?;

        let row = sqlx::query_as::<_, EventRow>(&format!("{SELECT_COLUMNS} WHERE id = $1 FOR UPDATE"))
            .bind(*id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| EventlogError::Persistence(e.to_string()))?
            .ok_or(EventlogError::RecordNotFound(id))?;

        let mut record = into_record(row)?;
        record.apply_attribution(update);

        sqlx::query(
            "UPDATE eventlog_events SET user_id = $2, reason = $3, changes = $4, options = $5, \
             waiting_for_backfill = $6 WHERE id = $1",
        )
        .bind(*id.as_uuid())
        .bind(&record.user_id)
        .bind(&record.reason)
        .bind(Json(&record.changes))
        .bind(Json(&record.options))
        .bind(record.waiting_for_backfill)
        .execute(&mut *tx)
        .await
        .map_err(|e| EventlogError::Persistence(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| EventlogError::Persistence(e.to_string()))?;

        Ok(record)
    }

    async fn get(&self, id: EventId) -> Result<EventRecord, EventlogError> {
        let row = sqlx::query_as::<_, EventRow>(&format!("{SELECT_COLUMNS} WHERE id = $1"))
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| EventlogError::Persistence(e.to_string()))?
            .ok_or(EventlogError::RecordNotFound(id))?;
        into_record(row)
    }

    async fn list_waiting(
        &self,
        guild_id: &str,
        action: ActionType,
    ) -> Result<Vec<EventRecord>, EventlogError> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "{SELECT_COLUMNS} WHERE guild_id = $1 AND action_type = $2 \
             AND waiting_for_backfill ORDER BY created_at ASC"
        ))
        .bind(guild_id)
        .bind(action.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| EventlogError::Persistence(e.to_string()))?;

        rows.into_iter().map(into_record).collect()
    }

    async fn list_for_guild(
        &self,
        guild_id: &str,
        limit: usize,
    ) -> Result<Vec<EventRecord>, EventlogError> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "{SELECT_COLUMNS} WHERE guild_id = $1 ORDER BY created_at DESC LIMIT $2"
        ))
        .bind(guild_id)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| EventlogError::Persistence(e.to_string()))?;

        rows.into_iter().map(into_record).collect()
    }
}
