//! Snapshots of the tracked guild entities.
//!
//! These are the `old`/`new` halves of a change notification. All fields
//! default so that partial payloads from the notification source still
//! deserialize; a missing field compares equal to its default.

use serde::{Deserialize, Serialize};

/// Channel kind as reported by the platform (numeric code).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelType(pub u8);

impl ChannelType {
    /// Guild text channel.
    pub const TEXT: Self = Self(0);
    /// Guild voice channel.
    pub const VOICE: Self = Self(2);
    /// Channel category.
    pub const CATEGORY: Self = Self(4);

    /// Lowercase name, or `""` for codes without a mapping.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self.0 {
            0 => "text",
            2 => "voice",
            4 => "category",
            _ => "",
        }
    }
}

/// Guild verification level (numeric code).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerificationLevel(pub u8);

impl VerificationLevel {
    /// Lowercase name, or `""` for levels without a mapping.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self.0 {
            0 => "none",
            1 => "low",
            2 => "medium",
            3 => "high",
            _ => "",
        }
    }
}

/// A permission overwrite attached to a channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionOverwrite {
    /// Role or member id the overwrite applies to.
    pub id: String,
    /// `"role"` or `"member"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Allowed permission bits.
    pub allow: u64,
    /// Denied permission bits.
    pub deny: u64,
}

/// A guild channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Channel {
    /// Channel id.
    pub id: String,
    /// Owning guild id.
    pub guild_id: String,
    /// Channel name.
    pub name: String,
    /// Channel kind.
    #[serde(rename = "type")]
    pub channel_type: ChannelType,
    /// Channel topic.
    pub topic: String,
    /// Age-restricted flag.
    pub nsfw: bool,
    /// Sort position.
    pub position: i64,
    /// Voice bitrate; zero for text channels.
    pub bitrate: i64,
    /// Parent category id.
    pub parent_id: String,
    /// Permission overwrites.
    pub permission_overwrites: Vec<PermissionOverwrite>,
}

impl Channel {
    /// Whether both snapshots carry the same overwrites, ignoring order.
    #[must_use]
    pub fn overwrites_match(&self, other: &Self) -> bool {
        self.permission_overwrites.len() == other.permission_overwrites.len()
            && self
                .permission_overwrites
                .iter()
                .all(|overwrite| other.permission_overwrites.contains(overwrite))
    }
}

/// A guild role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Role {
    /// Role id.
    pub id: String,
    /// Role name.
    pub name: String,
    /// Managed by an integration.
    pub managed: bool,
    /// Mentionable by everyone.
    pub mentionable: bool,
    /// Displayed separately in the member list.
    pub hoist: bool,
    /// RGB colour; zero means "no colour".
    pub color: u32,
    /// Sort position.
    pub position: i64,
    /// Permission bit set.
    pub permissions: u64,
}

/// Guild-level settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Guild {
    /// Guild id.
    pub id: String,
    /// Guild name.
    pub name: String,
    /// Icon hash.
    pub icon: String,
    /// Voice region.
    pub region: String,
    /// AFK channel id.
    pub afk_channel_id: String,
    /// Widget channel id.
    pub embed_channel_id: String,
    /// Owner user id.
    pub owner_id: String,
    /// Invite splash hash.
    pub splash: String,
    /// AFK timeout in seconds.
    pub afk_timeout: i64,
    /// Verification level.
    pub verification_level: VerificationLevel,
    /// Widget enabled flag.
    pub embed_enabled: bool,
    /// Default notification setting code.
    pub default_message_notifications: i64,
}

/// A custom emoji.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Emoji {
    /// Emoji id; empty for unicode emoji.
    pub id: String,
    /// Emoji name.
    pub name: String,
    /// Managed by an integration.
    pub managed: bool,
    /// Must be wrapped in colons.
    pub require_colons: bool,
    /// Animated emoji.
    pub animated: bool,
}

impl Emoji {
    /// Name used in API routes: `name:id` for custom emoji, the bare name
    /// otherwise.
    #[must_use]
    pub fn api_name(&self) -> String {
        if self.id.is_empty() {
            self.name.clone()
        } else {
            format!("{}:{}", self.name, self.id)
        }
    }
}

/// A platform user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    /// User id.
    pub id: String,
    /// Username.
    pub username: String,
    /// Four-digit discriminator.
    pub discriminator: String,
    /// Avatar hash; empty for the default avatar.
    pub avatar: String,
}

impl User {
    /// `username#discriminator`.
    #[must_use]
    pub fn tag(&self) -> String {
        format!("{}#{}", self.username, self.discriminator)
    }

    /// CDN URL of the avatar at the given size.
    #[must_use]
    pub fn avatar_url(&self, size: u32) -> String {
        if self.avatar.is_empty() {
            let index = self.discriminator.parse::<u32>().unwrap_or(0) % 5;
            return format!("https://cdn.discordapp.com/embed/avatars/{index}.png");
        }
        let ext = if self.avatar.starts_with("a_") { "gif" } else { "png" };
        format!(
            "https://cdn.discordapp.com/avatars/{}/{}.{ext}?size={size}",
            self.id, self.avatar
        )
    }
}

/// A guild member.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Member {
    /// Guild id.
    pub guild_id: String,
    /// Underlying user.
    pub user: User,
    /// Guild nickname.
    pub nick: String,
    /// Role ids held by the member.
    pub roles: Vec<String>,
}
