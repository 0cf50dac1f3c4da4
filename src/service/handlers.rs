//! Per-change-type notification handlers.
//!
//! Each [`EntityChange`] becomes exactly one [`NewEventRecord`] handed to
//! the [`EventSink`]. When the sink accepts the record and the change kind
//! supports delayed attribution, a backfill request follows.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{BackfillQueue, EventSink};
use crate::domain::{
    ActionType, BackfillKind, Channel, Emoji, Guild, Member, NewEventRecord, Role, TargetType,
    TrackedEntity, User,
};
use crate::error::EventlogError;
use crate::guild::CachedUserDirectory;

/// A change notification from the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntityChange {
    /// A channel was created.
    ChannelCreate {
        /// The new channel.
        channel: Channel,
    },
    /// A channel was deleted.
    ChannelDelete {
        /// The channel as last seen.
        channel: Channel,
    },
    /// A channel was edited.
    ChannelUpdate {
        /// Snapshot before the edit.
        old: Channel,
        /// Snapshot after the edit.
        new: Channel,
    },
    /// A role was created.
    RoleCreate {
        /// Owning guild.
        guild_id: String,
        /// The new role.
        role: Role,
    },
    /// A role was deleted.
    RoleDelete {
        /// Owning guild.
        guild_id: String,
        /// Id of the removed role.
        role_id: String,
    },
    /// A role was edited.
    RoleUpdate {
        /// Owning guild.
        guild_id: String,
        /// Snapshot before the edit.
        old: Role,
        /// Snapshot after the edit.
        new: Role,
    },
    /// A member's roles, name or nickname changed.
    MemberUpdate {
        /// Snapshot before the change.
        old: Member,
        /// Snapshot after the change.
        new: Member,
    },
    /// A member left or was kicked.
    MemberRemove {
        /// The member as last seen.
        member: Member,
    },
    /// A user was banned.
    BanAdd {
        /// Owning guild.
        guild_id: String,
        /// The banned user.
        user: User,
    },
    /// A ban was lifted.
    BanRemove {
        /// Owning guild.
        guild_id: String,
        /// The unbanned user.
        user: User,
    },
    /// An emoji was added.
    EmojiCreate {
        /// Owning guild.
        guild_id: String,
        /// The new emoji.
        emoji: Emoji,
    },
    /// An emoji was removed.
    EmojiDelete {
        /// Owning guild.
        guild_id: String,
        /// The emoji as last seen.
        emoji: Emoji,
    },
    /// An emoji was edited.
    EmojiUpdate {
        /// Owning guild.
        guild_id: String,
        /// Snapshot before the edit.
        old: Emoji,
        /// Snapshot after the edit.
        new: Emoji,
    },
    /// Guild-level settings changed.
    GuildUpdate {
        /// Snapshot before the change.
        old: Guild,
        /// Snapshot after the change.
        new: Guild,
    },
}

impl EntityChange {
    /// Guild the change belongs to.
    #[must_use]
    pub fn guild_id(&self) -> &str {
        match self {
            Self::ChannelCreate { channel } | Self::ChannelDelete { channel } => &channel.guild_id,
            Self::ChannelUpdate { new, .. } => &new.guild_id,
            Self::MemberUpdate { new, .. } => &new.guild_id,
            Self::MemberRemove { member } => &member.guild_id,
            Self::GuildUpdate { new, .. } => &new.id,
            Self::RoleCreate { guild_id, .. }
            | Self::RoleDelete { guild_id, .. }
            | Self::RoleUpdate { guild_id, .. }
            | Self::BanAdd { guild_id, .. }
            | Self::BanRemove { guild_id, .. }
            | Self::EmojiCreate { guild_id, .. }
            | Self::EmojiDelete { guild_id, .. }
            | Self::EmojiUpdate { guild_id, .. } => guild_id,
        }
    }

    /// Id of the entity the change is about.
    #[must_use]
    pub fn target_id(&self) -> &str {
        match self {
            Self::ChannelCreate { channel } | Self::ChannelDelete { channel } => &channel.id,
            Self::ChannelUpdate { new, .. } => &new.id,
            Self::RoleCreate { role, .. } => &role.id,
            Self::RoleDelete { role_id, .. } => role_id,
            Self::RoleUpdate { new, .. } => &new.id,
            Self::MemberUpdate { new, .. } => &new.user.id,
            Self::MemberRemove { member } => &member.user.id,
            Self::BanAdd { user, .. } | Self::BanRemove { user, .. } => &user.id,
            Self::EmojiCreate { emoji, .. } | Self::EmojiDelete { emoji, .. } => &emoji.id,
            Self::EmojiUpdate { new, .. } => &new.id,
            Self::GuildUpdate { new, .. } => &new.id,
        }
    }

    /// Kind of the target entity.
    #[must_use]
    pub const fn target_type(&self) -> TargetType {
        match self {
            Self::ChannelCreate { .. } | Self::ChannelDelete { .. } | Self::ChannelUpdate { .. } => {
                TargetType::Channel
            }
            Self::RoleCreate { .. } | Self::RoleDelete { .. } | Self::RoleUpdate { .. } => {
                TargetType::Role
            }
            Self::MemberUpdate { .. }
            | Self::MemberRemove { .. }
            | Self::BanAdd { .. }
            | Self::BanRemove { .. } => TargetType::User,
            Self::EmojiCreate { .. } | Self::EmojiDelete { .. } | Self::EmojiUpdate { .. } => {
                TargetType::Emoji
            }
            Self::GuildUpdate { .. } => TargetType::Guild,
        }
    }

    /// Action type of the record this change produces.
    #[must_use]
    pub const fn action_type(&self) -> ActionType {
        match self {
            Self::ChannelCreate { .. } => ActionType::ChannelCreate,
            Self::ChannelDelete { .. } => ActionType::ChannelDelete,
            Self::ChannelUpdate { .. } => ActionType::ChannelUpdate,
            Self::RoleCreate { .. } => ActionType::RoleCreate,
            Self::RoleDelete { .. } => ActionType::RoleDelete,
            Self::RoleUpdate { .. } => ActionType::RoleUpdate,
            Self::MemberUpdate { .. } => ActionType::MemberUpdate,
            Self::MemberRemove { .. } => ActionType::MemberLeave,
            Self::BanAdd { .. } => ActionType::BanAdd,
            Self::BanRemove { .. } => ActionType::BanRemove,
            Self::EmojiCreate { .. } => ActionType::EmojiCreate,
            Self::EmojiDelete { .. } => ActionType::EmojiDelete,
            Self::EmojiUpdate { .. } => ActionType::EmojiUpdate,
            Self::GuildUpdate { .. } => ActionType::GuildUpdate,
        }
    }

    /// Backfill kind requested after a successful record, if any.
    ///
    /// Member updates are never backfilled.
    #[must_use]
    pub const fn backfill_kind(&self) -> Option<BackfillKind> {
        match self {
            Self::ChannelCreate { .. } => Some(BackfillKind::ChannelCreate),
            Self::ChannelDelete { .. } => Some(BackfillKind::ChannelDelete),
            Self::ChannelUpdate { .. } => Some(BackfillKind::ChannelUpdate),
            Self::RoleCreate { .. } => Some(BackfillKind::RoleCreate),
            Self::RoleDelete { .. } => Some(BackfillKind::RoleDelete),
            Self::RoleUpdate { .. } => Some(BackfillKind::RoleUpdate),
            Self::MemberUpdate { .. } => None,
            Self::MemberRemove { .. } => Some(BackfillKind::MemberRemove),
            Self::BanAdd { .. } => Some(BackfillKind::BanAdd),
            Self::BanRemove { .. } => Some(BackfillKind::BanRemove),
            Self::EmojiCreate { .. } => Some(BackfillKind::EmojiCreate),
            Self::EmojiDelete { .. } => Some(BackfillKind::EmojiDelete),
            Self::EmojiUpdate { .. } => Some(BackfillKind::EmojiUpdate),
            Self::GuildUpdate { .. } => Some(BackfillKind::GuildUpdate),
        }
    }

    /// Builds the record for this change.
    #[must_use]
    pub fn to_record(&self) -> NewEventRecord {
        let base = NewEventRecord::new(
            self.guild_id(),
            self.target_id(),
            self.target_type(),
            self.action_type(),
        )
        .waiting_for_backfill(self.backfill_kind().is_some());

        match self {
            Self::ChannelCreate { channel } | Self::ChannelDelete { channel } => {
                base.options(channel.snapshot())
            }
            Self::ChannelUpdate { old, new } => {
                if !old.overwrites_match(new) {
                    tracing::debug!(channel_id = %new.id, "permission overwrites changed");
                }
                base.changes(Channel::diff(old, new).changes)
            }
            Self::RoleCreate { role, .. } => base.options(role.snapshot()),
            Self::RoleUpdate { old, new, .. } => base.changes(Role::diff(old, new).changes),
            Self::MemberUpdate { old, new } => {
                let diff = Member::diff(old, new);
                base.changes(diff.changes).options(diff.options)
            }
            Self::EmojiCreate { emoji, .. } | Self::EmojiDelete { emoji, .. } => {
                base.options(emoji.snapshot())
            }
            Self::EmojiUpdate { old, new, .. } => {
                base.changes(Emoji::diff(old, new).changes).options(new.snapshot())
            }
            Self::GuildUpdate { old, new } => base.changes(Guild::diff(old, new).changes),
            Self::RoleDelete { .. }
            | Self::MemberRemove { .. }
            | Self::BanAdd { .. }
            | Self::BanRemove { .. } => base,
        }
    }

    fn users(&self) -> Vec<&User> {
        match self {
            Self::MemberUpdate { new, .. } => vec![&new.user],
            Self::MemberRemove { member } => vec![&member.user],
            Self::BanAdd { user, .. } | Self::BanRemove { user, .. } => vec![user],
            _ => Vec::new(),
        }
    }
}

/// Turns change notifications into records and backfill requests.
#[derive(Debug, Clone)]
pub struct EventlogHandlers {
    sink: EventSink,
    backfill: BackfillQueue,
    user_cache: Option<Arc<CachedUserDirectory>>,
}

impl EventlogHandlers {
    /// Creates handlers over a sink and a backfill queue.
    #[must_use]
    pub fn new(sink: EventSink, backfill: BackfillQueue) -> Self {
        Self {
            sink,
            backfill,
            user_cache: None,
        }
    }

    /// Feeds users seen in member and ban notifications into `cache`.
    #[must_use]
    pub fn with_user_cache(mut self, cache: Arc<CachedUserDirectory>) -> Self {
        self.user_cache = Some(cache);
        self
    }

    /// Returns the sink records are written through.
    #[must_use]
    pub fn sink(&self) -> &EventSink {
        &self.sink
    }

    /// Handles one notification.
    ///
    /// Returns whether a record was persisted. A failed backfill request is
    /// logged and does not fail the notification.
    ///
    /// # Errors
    ///
    /// Returns the sink's error when the record could not be persisted.
    pub async fn handle(&self, change: &EntityChange) -> Result<bool, EventlogError> {
        if let Some(cache) = &self.user_cache {
            for user in change.users() {
                cache.remember(user).await;
            }
        }

        let added = self.sink.record(change.to_record()).await?;

        if added
            && let Some(kind) = change.backfill_kind()
            && let Err(e) = self.backfill.enqueue(change.guild_id(), kind).await
        {
            tracing::warn!(
                guild_id = %change.guild_id(),
                %kind,
                error = %e,
                "failed to request backfill"
            );
        }
        Ok(added)
    }
}
