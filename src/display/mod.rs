//! Display layer: rendering records and posting them to surfaces.
//!
//! A display surface is any place a rendered event can be posted and
//! later edited in place (a guild's event-log channel, for instance).

pub mod embed;
pub mod render;
pub mod tracing_surface;

use std::fmt;

use async_trait::async_trait;

use crate::error::EventlogError;

pub use embed::{Embed, EmbedAuthor, EmbedField};
pub use render::{UNKNOWN_AUTHOR, render};
pub use tracing_surface::TracingSurface;

/// Posts and edits rendered events.
#[async_trait]
pub trait DisplaySurface: Send + Sync + fmt::Debug {
    /// Posts `embed` to `surface_id` and returns the new message id.
    ///
    /// # Errors
    ///
    /// Returns [`EventlogError::DisplaySurface`] when the post fails.
    async fn publish(&self, surface_id: &str, embed: &Embed) -> Result<String, EventlogError>;

    /// Replaces the content of an existing message.
    ///
    /// # Errors
    ///
    /// Returns [`EventlogError::DisplaySurface`] when the edit fails.
    async fn edit(
        &self,
        surface_id: &str,
        message_id: &str,
        embed: &Embed,
    ) -> Result<(), EventlogError>;
}
