//! Guild policy loaded once from configuration.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use super::GuildSettingsProvider;
use crate::config::EventlogConfig;

/// [`GuildSettingsProvider`] backed by fixed sets.
#[derive(Debug, Clone, Default)]
pub struct StaticGuildSettings {
    blacklisted: HashSet<String>,
    limited: HashSet<String>,
    disabled: HashSet<String>,
    surfaces: HashMap<String, Vec<String>>,
}

impl StaticGuildSettings {
    /// Creates settings with no restrictions and no surfaces.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the settings from the loaded configuration.
    #[must_use]
    pub fn from_config(config: &EventlogConfig) -> Self {
        let mut settings = Self::new();
        for guild_id in &config.blacklisted_guilds {
            settings = settings.blacklist(guild_id);
        }
        for guild_id in &config.limited_guilds {
            settings = settings.limit(guild_id);
        }
        for guild_id in &config.eventlog_disabled_guilds {
            settings = settings.disable(guild_id);
        }
        for (guild_id, channel_id) in &config.eventlog_channels {
            settings = settings.surface(guild_id, channel_id);
        }
        settings
    }

    /// Marks a guild as blacklisted.
    #[must_use]
    pub fn blacklist(mut self, guild_id: impl Into<String>) -> Self {
        self.blacklisted.insert(guild_id.into());
        self
    }

    /// Marks a guild as limited.
    #[must_use]
    pub fn limit(mut self, guild_id: impl Into<String>) -> Self {
        self.limited.insert(guild_id.into());
        self
    }

    /// Turns event logging off for a guild.
    #[must_use]
    pub fn disable(mut self, guild_id: impl Into<String>) -> Self {
        self.disabled.insert(guild_id.into());
        self
    }

    /// Adds an event-log channel to a guild. Duplicates are ignored.
    #[must_use]
    pub fn surface(mut self, guild_id: impl Into<String>, surface_id: impl Into<String>) -> Self {
        let surface_id = surface_id.into();
        let surfaces = self.surfaces.entry(guild_id.into()).or_default();
        if !surfaces.contains(&surface_id) {
            surfaces.push(surface_id);
        }
        self
    }
}

#[async_trait]
impl GuildSettingsProvider for StaticGuildSettings {
    async fn is_blacklisted(&self, guild_id: &str) -> bool {
        self.blacklisted.contains(guild_id)
    }

    async fn is_limited(&self, guild_id: &str) -> bool {
        self.limited.contains(guild_id)
    }

    async fn eventlog_disabled(&self, guild_id: &str) -> bool {
        self.disabled.contains(guild_id)
    }

    async fn display_surfaces(&self, guild_id: &str) -> Vec<String> {
        self.surfaces.get(guild_id).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builder_flags_are_per_guild() {
        let settings = StaticGuildSettings::new()
            .blacklist("g1")
            .limit("g2")
            .disable("g3");
        assert!(settings.is_blacklisted("g1").await);
        assert!(!settings.is_blacklisted("g2").await);
        assert!(settings.is_limited("g2").await);
        assert!(settings.eventlog_disabled("g3").await);
        assert!(!settings.eventlog_disabled("g1").await);
    }

    #[tokio::test]
    async fn surfaces_keep_insertion_order() {
        let settings = StaticGuildSettings::new()
            .surface("g1", "c2")
            .surface("g1", "c1")
            .surface("g1", "c2");
        assert_eq!(settings.display_surfaces("g1").await, vec!["c2", "c1"]);
        assert!(settings.display_surfaces("g9").await.is_empty());
    }
}
