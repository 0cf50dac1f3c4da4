//! Per-guild policy and user lookups consumed by the event sink.

pub mod settings;
pub mod users;

use std::fmt;

use async_trait::async_trait;

use crate::domain::User;
use crate::error::EventlogError;

pub use settings::StaticGuildSettings;
pub use users::CachedUserDirectory;

/// Per-guild event-log policy.
#[async_trait]
pub trait GuildSettingsProvider: Send + Sync + fmt::Debug {
    /// Whether the guild is blacklisted from the bot entirely.
    async fn is_blacklisted(&self, guild_id: &str) -> bool;

    /// Whether the guild runs in the restricted, feature-limited mode.
    async fn is_limited(&self, guild_id: &str) -> bool;

    /// Whether the guild switched event logging off.
    async fn eventlog_disabled(&self, guild_id: &str) -> bool;

    /// Display surfaces (event-log channels) configured for the guild.
    async fn display_surfaces(&self, guild_id: &str) -> Vec<String>;
}

/// Resolves user ids to profiles for the author block.
#[async_trait]
pub trait UserDirectory: Send + Sync + fmt::Debug {
    /// Looks up one user.
    ///
    /// # Errors
    ///
    /// Returns [`EventlogError::InvalidRequest`] when the user is unknown
    /// to the directory.
    async fn resolve(&self, user_id: &str) -> Result<User, EventlogError>;
}
