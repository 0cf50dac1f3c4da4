//! Kinds of delayed attribution the engine can request.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ActionType;
use crate::error::EventlogError;

/// Event kind for which the attribution feed is asked "who did it".
///
/// Member updates have no kind and are never backfilled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackfillKind {
    /// Channel created.
    ChannelCreate,
    /// Channel deleted.
    ChannelDelete,
    /// Channel updated.
    ChannelUpdate,
    /// Role created.
    RoleCreate,
    /// Role deleted.
    RoleDelete,
    /// Ban added.
    BanAdd,
    /// Ban removed.
    BanRemove,
    /// Member removed (kick or leave).
    MemberRemove,
    /// Emoji created.
    EmojiCreate,
    /// Emoji deleted.
    EmojiDelete,
    /// Emoji updated.
    EmojiUpdate,
    /// Guild updated.
    GuildUpdate,
    /// Role updated.
    RoleUpdate,
}

impl BackfillKind {
    /// Every kind, in the order the reconciler drains them.
    pub const ALL: [Self; 13] = [
        Self::ChannelCreate,
        Self::ChannelDelete,
        Self::ChannelUpdate,
        Self::RoleCreate,
        Self::RoleDelete,
        Self::BanAdd,
        Self::BanRemove,
        Self::MemberRemove,
        Self::EmojiCreate,
        Self::EmojiDelete,
        Self::EmojiUpdate,
        Self::GuildUpdate,
        Self::RoleUpdate,
    ];

    /// Snake-case name of the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ChannelCreate => "channel_create",
            Self::ChannelDelete => "channel_delete",
            Self::ChannelUpdate => "channel_update",
            Self::RoleCreate => "role_create",
            Self::RoleDelete => "role_delete",
            Self::BanAdd => "ban_add",
            Self::BanRemove => "ban_remove",
            Self::MemberRemove => "member_remove",
            Self::EmojiCreate => "emoji_create",
            Self::EmojiDelete => "emoji_delete",
            Self::EmojiUpdate => "emoji_update",
            Self::GuildUpdate => "guild_update",
            Self::RoleUpdate => "role_update",
        }
    }

    /// Name of the per-kind set holding pending guild ids.
    #[must_use]
    pub fn set_name(&self) -> String {
        format!("eventlog:backfill:{}", self.as_str())
    }

    /// The record action type this kind attributes.
    #[must_use]
    pub const fn action_type(&self) -> ActionType {
        match self {
            Self::ChannelCreate => ActionType::ChannelCreate,
            Self::ChannelDelete => ActionType::ChannelDelete,
            Self::ChannelUpdate => ActionType::ChannelUpdate,
            Self::RoleCreate => ActionType::RoleCreate,
            Self::RoleDelete => ActionType::RoleDelete,
            Self::BanAdd => ActionType::BanAdd,
            Self::BanRemove => ActionType::BanRemove,
            Self::MemberRemove => ActionType::MemberLeave,
            Self::EmojiCreate => ActionType::EmojiCreate,
            Self::EmojiDelete => ActionType::EmojiDelete,
            Self::EmojiUpdate => ActionType::EmojiUpdate,
            Self::GuildUpdate => ActionType::GuildUpdate,
            Self::RoleUpdate => ActionType::RoleUpdate,
        }
    }
}

impl fmt::Display for BackfillKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackfillKind {
    type Err = EventlogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| EventlogError::UnknownBackfillKind(s.to_string()))
    }
}
