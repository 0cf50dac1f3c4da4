//! Recording collaborators shared by the service tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::display::{DisplaySurface, Embed};
use crate::domain::{ActionType, AttributionUpdate, EventId, EventRecord};
use crate::error::EventlogError;
use crate::guild::{GuildSettingsProvider, StaticGuildSettings};
use crate::persistence::EventStore;

/// One call observed by [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceCall {
    Publish { surface_id: String, title: String },
    Edit { surface_id: String, message_id: String, embed: Embed },
}

/// Surface that records every call and fails for chosen surface ids.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    failing: HashSet<String>,
    next_message: AtomicUsize,
    calls: Mutex<Vec<SurfaceCall>>,
}

impl RecordingSurface {
    pub fn failing_on(surfaces: &[&str]) -> Self {
        Self {
            failing: surfaces.iter().map(|s| (*s).to_string()).collect(),
            ..Self::default()
        }
    }

    pub async fn calls(&self) -> Vec<SurfaceCall> {
        self.calls.lock().await.clone()
    }

    pub async fn edits(&self) -> Vec<SurfaceCall> {
        self.calls()
            .await
            .into_iter()
            .filter(|call| matches!(call, SurfaceCall::Edit { .. }))
            .collect()
    }

    fn check(&self, surface_id: &str) -> Result<(), EventlogError> {
        if self.failing.contains(surface_id) {
            return Err(EventlogError::DisplaySurface {
                surface_id: surface_id.to_string(),
                message: "unreachable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DisplaySurface for RecordingSurface {
    async fn publish(&self, surface_id: &str, embed: &Embed) -> Result<String, EventlogError> {
        self.calls.lock().await.push(SurfaceCall::Publish {
            surface_id: surface_id.to_string(),
            title: embed.title.clone(),
        });
        self.check(surface_id)?;
        let n = self.next_message.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(format!("m{n}"))
    }

    async fn edit(
        &self,
        surface_id: &str,
        message_id: &str,
        embed: &Embed,
    ) -> Result<(), EventlogError> {
        self.calls.lock().await.push(SurfaceCall::Edit {
            surface_id: surface_id.to_string(),
            message_id: message_id.to_string(),
            embed: embed.clone(),
        });
        self.check(surface_id)
    }
}

/// Settings wrapper counting how often it is consulted.
#[derive(Debug, Default)]
pub struct CountingSettings {
    inner: StaticGuildSettings,
    calls: AtomicUsize,
}

impl CountingSettings {
    pub fn new(inner: StaticGuildSettings) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::Relaxed);
    }
}

#[async_trait]
impl GuildSettingsProvider for CountingSettings {
    async fn is_blacklisted(&self, guild_id: &str) -> bool {
        self.hit();
        self.inner.is_blacklisted(guild_id).await
    }

    async fn is_limited(&self, guild_id: &str) -> bool {
        self.hit();
        self.inner.is_limited(guild_id).await
    }

    async fn eventlog_disabled(&self, guild_id: &str) -> bool {
        self.hit();
        self.inner.eventlog_disabled(guild_id).await
    }

    async fn display_surfaces(&self, guild_id: &str) -> Vec<String> {
        self.hit();
        self.inner.display_surfaces(guild_id).await
    }
}

/// Store whose every call fails.
#[derive(Debug, Default)]
pub struct BrokenStore;

#[async_trait]
impl EventStore for BrokenStore {
    async fn append(&self, _record: &EventRecord) -> Result<EventId, EventlogError> {
        Err(EventlogError::Persistence("database offline".to_string()))
    }

    async fn update(
        &self,
        _id: EventId,
        _update: &AttributionUpdate,
    ) -> Result<EventRecord, EventlogError> {
        Err(EventlogError::Persistence("database offline".to_string()))
    }

    async fn get(&self, _id: EventId) -> Result<EventRecord, EventlogError> {
        Err(EventlogError::Persistence("database offline".to_string()))
    }

    async fn list_waiting(
        &self,
        _guild_id: &str,
        _action: ActionType,
    ) -> Result<Vec<EventRecord>, EventlogError> {
        Err(EventlogError::Persistence("database offline".to_string()))
    }

    async fn list_for_guild(
        &self,
        _guild_id: &str,
        _limit: usize,
    ) -> Result<Vec<EventRecord>, EventlogError> {
        Err(EventlogError::Persistence("database offline".to_string()))
    }
}
