//! Display surface that writes rendered events to the log.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use super::DisplaySurface;
use super::embed::Embed;
use crate::error::EventlogError;

/// [`DisplaySurface`] that emits each embed as a structured `tracing`
/// event and hands out sequential message ids.
#[derive(Debug, Default)]
pub struct TracingSurface {
    next_message: AtomicU64,
}

impl TracingSurface {
    /// Creates a surface whose first message id is `1`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DisplaySurface for TracingSurface {
    async fn publish(&self, surface_id: &str, embed: &Embed) -> Result<String, EventlogError> {
        let message_id = self
            .next_message
            .fetch_add(1, Ordering::Relaxed)
            .saturating_add(1)
            .to_string();
        let body = serde_json::to_string(embed).map_err(|e| EventlogError::DisplaySurface {
            surface_id: surface_id.to_string(),
            message: e.to_string(),
        })?;
        tracing::info!(surface_id, %message_id, title = %embed.title, %body, "eventlog message posted");
        Ok(message_id)
    }

    async fn edit(
        &self,
        surface_id: &str,
        message_id: &str,
        embed: &Embed,
    ) -> Result<(), EventlogError> {
        let body = serde_json::to_string(embed).map_err(|e| EventlogError::DisplaySurface {
            surface_id: surface_id.to_string(),
            message: e.to_string(),
        })?;
        tracing::info!(surface_id, message_id, title = %embed.title, %body, "eventlog message edited");
        Ok(())
    }
}
