//! Event sink: policy checks, rendering, publishing and persistence.

use std::sync::Arc;

use chrono::Utc;
use futures_util::future::join_all;

use crate::display::{DisplaySurface, Embed, render};
use crate::domain::{AttributionUpdate, DisplayRef, EventId, EventRecord, NewEventRecord, User};
use crate::error::EventlogError;
use crate::guild::{GuildSettingsProvider, UserDirectory};
use crate::persistence::EventStore;

/// Accepts new event records and attribution updates.
///
/// Holds no mutable state of its own; every collaborator is shared
/// behind an `Arc`, so the sink is cheap to clone into worker tasks.
#[derive(Debug, Clone)]
pub struct EventSink {
    settings: Arc<dyn GuildSettingsProvider>,
    store: Arc<dyn EventStore>,
    surface: Arc<dyn DisplaySurface>,
    users: Arc<dyn UserDirectory>,
}

impl EventSink {
    /// Creates a sink over its collaborators.
    #[must_use]
    pub fn new(
        settings: Arc<dyn GuildSettingsProvider>,
        store: Arc<dyn EventStore>,
        surface: Arc<dyn DisplaySurface>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            settings,
            store,
            surface,
            users,
        }
    }

    /// Returns the underlying event store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn EventStore> {
        &self.store
    }

    /// Records one event.
    ///
    /// Returns `Ok(false)` without touching the store or any surface when
    /// the guild id is empty, or the guild is blacklisted, limited or has
    /// event logging disabled (checked in that order). Otherwise the
    /// record is rendered and posted to every configured surface; a
    /// failing surface is logged and skipped. The record is then
    /// persisted together with the display references obtained.
    ///
    /// # Errors
    ///
    /// Returns [`EventlogError::Persistence`] if the record could not be
    /// stored. Messages already posted stay posted.
    pub async fn record(&self, new: NewEventRecord) -> Result<bool, EventlogError> {
        if self.suppressed(&new.guild_id).await {
            tracing::debug!(guild_id = %new.guild_id, action = %new.action_type, "event suppressed");
            return Ok(false);
        }

        let mut record = new.into_record(Utc::now());
        let embed = self.render(&record).await;

        for surface_id in self.settings.display_surfaces(&record.guild_id).await {
            match self.surface.publish(&surface_id, &embed).await {
                Ok(message_id) => {
                    record.add_display_ref(DisplayRef::new(surface_id, message_id));
                }
                Err(e) => {
                    tracing::warn!(
                        guild_id = %record.guild_id,
                        %surface_id,
                        error = %e,
                        "failed to post eventlog message"
                    );
                }
            }
        }

        self.store.append(&record).await?;

        tracing::info!(
            event_id = %record.id,
            guild_id = %record.guild_id,
            action = %record.action_type,
            target_id = %record.target_id,
            surfaces = record.display_refs.len(),
            "event recorded"
        );
        Ok(true)
    }

    /// Applies attribution to a stored record and refreshes every posted
    /// rendering of it.
    ///
    /// Edits run concurrently and are best-effort: a failing edit is
    /// logged and never prevents the others.
    ///
    /// # Errors
    ///
    /// Returns [`EventlogError::RecordNotFound`] for an unknown id and
    /// [`EventlogError::Persistence`] if the update could not be stored.
    pub async fn update_attribution(
        &self,
        id: EventId,
        update: AttributionUpdate,
    ) -> Result<EventRecord, EventlogError> {
        let record = self.store.update(id, &update).await?;
        let embed = self.render(&record).await;

        let edits = record
            .display_refs
            .iter()
            .map(|display_ref| self.refresh(display_ref, &embed));
        let failed = join_all(edits).await.into_iter().filter(|ok| !ok).count();

        tracing::info!(
            event_id = %id,
            guild_id = %record.guild_id,
            user_id = %record.user_id,
            edits = record.display_refs.len(),
            failed,
            "event attributed"
        );
        Ok(record)
    }

    async fn suppressed(&self, guild_id: &str) -> bool {
        guild_id.is_empty()
            || self.settings.is_blacklisted(guild_id).await
            || self.settings.is_limited(guild_id).await
            || self.settings.eventlog_disabled(guild_id).await
    }

    async fn render(&self, record: &EventRecord) -> Embed {
        let author = self.resolve_author(&record.user_id).await;
        render(record, author.as_ref())
    }

    async fn resolve_author(&self, user_id: &str) -> Option<User> {
        if user_id.is_empty() {
            return None;
        }
        match self.users.resolve(user_id).await {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::debug!(%user_id, error = %e, "author lookup failed");
                None
            }
        }
    }

    async fn refresh(&self, display_ref: &DisplayRef, embed: &Embed) -> bool {
        match self
            .surface
            .edit(&display_ref.surface_id, &display_ref.message_id, embed)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    surface_id = %display_ref.surface_id,
                    message_id = %display_ref.message_id,
                    error = %e,
                    "failed to edit eventlog message"
                );
                false
            }
        }
    }
}
