//! The durable audit-trail entry and its attribution state.
//!
//! An [`EventRecord`] is append-only except for its attribution fields
//! (`user_id`, `reason`, `waiting_for_backfill`, extra changes/options) and
//! its `display_refs`, which only ever grow.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::EventId;

/// Kind of entity an event is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    /// A user or guild member.
    User,
    /// A guild channel or category.
    Channel,
    /// A guild role.
    Role,
    /// The guild itself.
    Guild,
    /// A custom emoji.
    Emoji,
}

impl TargetType {
    /// Returns the stored name of the target type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Channel => "channel",
            Self::Role => "role",
            Self::Guild => "guild",
            Self::Emoji => "emoji",
        }
    }

    /// Parses a stored target type name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        [Self::User, Self::Channel, Self::Role, Self::Guild, Self::Emoji]
            .into_iter()
            .find(|target| target.as_str() == name)
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Enumerated kind of logged event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// A channel was created.
    ChannelCreate,
    /// A channel was deleted.
    ChannelDelete,
    /// A channel's settings changed.
    ChannelUpdate,
    /// A role was created.
    RoleCreate,
    /// A role was deleted.
    RoleDelete,
    /// A role's settings changed.
    RoleUpdate,
    /// A member's roles, name or nickname changed.
    MemberUpdate,
    /// A member left or was removed from the guild.
    MemberLeave,
    /// A user was banned.
    BanAdd,
    /// A ban was lifted.
    BanRemove,
    /// A custom emoji was added.
    EmojiCreate,
    /// A custom emoji was removed.
    EmojiDelete,
    /// A custom emoji was edited.
    EmojiUpdate,
    /// Guild-level settings changed.
    GuildUpdate,
}

impl ActionType {
    /// Every action type, in declaration order.
    pub const ALL: [Self; 14] = [
        Self::ChannelCreate,
        Self::ChannelDelete,
        Self::ChannelUpdate,
        Self::RoleCreate,
        Self::RoleDelete,
        Self::RoleUpdate,
        Self::MemberUpdate,
        Self::MemberLeave,
        Self::BanAdd,
        Self::BanRemove,
        Self::EmojiCreate,
        Self::EmojiDelete,
        Self::EmojiUpdate,
        Self::GuildUpdate,
    ];

    /// Returns the stored name of the action type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ChannelCreate => "channel_create",
            Self::ChannelDelete => "channel_delete",
            Self::ChannelUpdate => "channel_update",
            Self::RoleCreate => "role_create",
            Self::RoleDelete => "role_delete",
            Self::RoleUpdate => "role_update",
            Self::MemberUpdate => "member_update",
            Self::MemberLeave => "member_leave",
            Self::BanAdd => "ban_add",
            Self::BanRemove => "ban_remove",
            Self::EmojiCreate => "emoji_create",
            Self::EmojiDelete => "emoji_delete",
            Self::EmojiUpdate => "emoji_update",
            Self::GuildUpdate => "guild_update",
        }
    }

    /// Parses a stored action type name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.as_str() == name)
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One before/after pair for a field that differed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventChange {
    /// Field key, e.g. `role_hoist`.
    pub key: String,
    /// Encoded value before the change.
    pub old_value: String,
    /// Encoded value after the change.
    pub new_value: String,
}

impl EventChange {
    /// Creates a change entry.
    #[must_use]
    pub fn new(
        key: impl Into<String>,
        old_value: impl Into<String>,
        new_value: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            old_value: old_value.into(),
            new_value: new_value.into(),
        }
    }
}

/// Supplementary context that is not a before/after pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventOption {
    /// Option key, e.g. `channel_name`.
    pub key: String,
    /// Encoded value.
    pub value: String,
}

impl EventOption {
    /// Creates an option entry.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Pointer to one published rendering of a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisplayRef {
    /// Surface (channel) the rendering was posted to.
    pub surface_id: String,
    /// Message id returned by the surface.
    pub message_id: String,
}

impl DisplayRef {
    /// Creates a display reference.
    #[must_use]
    pub fn new(surface_id: impl Into<String>, message_id: impl Into<String>) -> Self {
        Self {
            surface_id: surface_id.into(),
            message_id: message_id.into(),
        }
    }
}

/// Attribution state of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributionState {
    /// No actor yet; the delayed feed is expected to supply one.
    Waiting,
    /// No actor and none will be requested. Terminal.
    Unattributed,
    /// An actor is known.
    Attributed,
}

/// A single audit-trail entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Record identifier (immutable).
    pub id: EventId,
    /// When the event happened.
    pub created_at: DateTime<Utc>,
    /// Owning guild.
    pub guild_id: String,
    /// Entity the event is about.
    pub target_id: String,
    /// Kind of the target entity.
    pub target_type: TargetType,
    /// Acting user; empty until attributed.
    pub user_id: String,
    /// Kind of event.
    pub action_type: ActionType,
    /// Free-text reason, possibly empty.
    pub reason: String,
    /// Differing fields in field-table order.
    pub changes: Vec<EventChange>,
    /// Supplementary key/value context.
    pub options: Vec<EventOption>,
    /// Whether attribution is still expected from the delayed feed.
    pub waiting_for_backfill: bool,
    /// Every published rendering of this record.
    pub display_refs: Vec<DisplayRef>,
}

impl EventRecord {
    /// Returns the attribution state derived from `user_id` and
    /// `waiting_for_backfill`.
    #[must_use]
    pub fn attribution_state(&self) -> AttributionState {
        if !self.user_id.is_empty() {
            AttributionState::Attributed
        } else if self.waiting_for_backfill {
            AttributionState::Waiting
        } else {
            AttributionState::Unattributed
        }
    }

    /// Records a published rendering.
    ///
    /// Returns `false` and leaves the record untouched when a reference for
    /// the same surface already exists.
    pub fn add_display_ref(&mut self, display_ref: DisplayRef) -> bool {
        if self
            .display_refs
            .iter()
            .any(|existing| existing.surface_id == display_ref.surface_id)
        {
            return false;
        }
        self.display_refs.push(display_ref);
        true
    }

    /// Applies an attribution update in place.
    ///
    /// Non-empty `user_id`/`reason` replace the stored values. Options and
    /// changes are merged by key: an existing key is overwritten in place,
    /// a new key is appended. `backfilled` clears `waiting_for_backfill`;
    /// nothing ever sets it again.
    pub fn apply_attribution(&mut self, update: &AttributionUpdate) {
        if !update.user_id.is_empty() {
            self.user_id.clone_from(&update.user_id);
        }
        if !update.reason.is_empty() {
            self.reason.clone_from(&update.reason);
        }
        for option in &update.options {
            match self.options.iter_mut().find(|o| o.key == option.key) {
                Some(existing) => existing.value.clone_from(&option.value),
                None => self.options.push(option.clone()),
            }
        }
        for change in &update.changes {
            match self.changes.iter_mut().find(|c| c.key == change.key) {
                Some(existing) => *existing = change.clone(),
                None => self.changes.push(change.clone()),
            }
        }
        if update.backfilled {
            self.waiting_for_backfill = false;
        }
    }
}

/// Input to [`crate::service::EventSink::record`].
///
/// The constructor is total: `changes` and `options` are always owned
/// vectors, and a missing `created_at` is resolved to the current time when
/// the record is assembled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEventRecord {
    /// Occurrence time; `None` means "now".
    pub created_at: Option<DateTime<Utc>>,
    /// Owning guild.
    pub guild_id: String,
    /// Entity the event is about.
    pub target_id: String,
    /// Kind of the target entity.
    pub target_type: TargetType,
    /// Acting user, if already known.
    pub user_id: String,
    /// Kind of event.
    pub action_type: ActionType,
    /// Free-text reason.
    pub reason: String,
    /// Differing fields.
    pub changes: Vec<EventChange>,
    /// Supplementary context.
    pub options: Vec<EventOption>,
    /// Whether attribution will be requested from the delayed feed.
    pub waiting_for_backfill: bool,
}

impl NewEventRecord {
    /// Starts a record with no changes, options, actor or reason.
    #[must_use]
    pub fn new(
        guild_id: impl Into<String>,
        target_id: impl Into<String>,
        target_type: TargetType,
        action_type: ActionType,
    ) -> Self {
        Self {
            created_at: None,
            guild_id: guild_id.into(),
            target_id: target_id.into(),
            target_type,
            user_id: String::new(),
            action_type,
            reason: String::new(),
            changes: Vec::new(),
            options: Vec::new(),
            waiting_for_backfill: false,
        }
    }

    /// Sets the occurrence time.
    #[must_use]
    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Sets the acting user.
    #[must_use]
    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    /// Sets the reason.
    #[must_use]
    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    /// Sets the changes.
    #[must_use]
    pub fn changes(mut self, changes: Vec<EventChange>) -> Self {
        self.changes = changes;
        self
    }

    /// Sets the options.
    #[must_use]
    pub fn options(mut self, options: Vec<EventOption>) -> Self {
        self.options = options;
        self
    }

    /// Marks the record as awaiting delayed attribution.
    #[must_use]
    pub fn waiting_for_backfill(mut self, waiting: bool) -> Self {
        self.waiting_for_backfill = waiting;
        self
    }

    /// Assembles the stored record, assigning a fresh id.
    #[must_use]
    pub fn into_record(self, now: DateTime<Utc>) -> EventRecord {
        EventRecord {
            id: EventId::new(),
            created_at: self.created_at.unwrap_or(now),
            guild_id: self.guild_id,
            target_id: self.target_id,
            target_type: self.target_type,
            user_id: self.user_id,
            action_type: self.action_type,
            reason: self.reason,
            changes: self.changes,
            options: self.options,
            waiting_for_backfill: self.waiting_for_backfill,
            display_refs: Vec::new(),
        }
    }
}

/// Attribution fields applied by [`crate::service::EventSink::update_attribution`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributionUpdate {
    /// Acting user resolved by the feed.
    pub user_id: String,
    /// Reason supplied by the feed.
    pub reason: String,
    /// Extra options to merge.
    pub options: Vec<EventOption>,
    /// Extra changes to merge.
    pub changes: Vec<EventChange>,
    /// Whether this update resolves the pending backfill.
    pub backfilled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn waiting_record() -> EventRecord {
        NewEventRecord::new("g1", "c1", TargetType::Channel, ActionType::ChannelUpdate)
            .waiting_for_backfill(true)
            .into_record(Utc::now())
    }

    #[test]
    fn missing_created_at_defaults_to_now() {
        let now = Utc::now();
        let record =
            NewEventRecord::new("g1", "u1", TargetType::User, ActionType::BanAdd).into_record(now);
        assert_eq!(record.created_at, now);
        assert!(record.changes.is_empty());
        assert!(record.options.is_empty());
        assert!(record.display_refs.is_empty());
    }

    #[test]
    fn explicit_created_at_is_kept() {
        let then = Utc::now() - chrono::Duration::minutes(3);
        let record = NewEventRecord::new("g1", "u1", TargetType::User, ActionType::BanAdd)
            .created_at(then)
            .into_record(Utc::now());
        assert_eq!(record.created_at, then);
    }

    #[test]
    fn display_refs_are_unique_per_surface() {
        let mut record = waiting_record();
        assert!(record.add_display_ref(DisplayRef::new("log-1", "m1")));
        assert!(!record.add_display_ref(DisplayRef::new("log-1", "m2")));
        assert!(record.add_display_ref(DisplayRef::new("log-2", "m3")));
        assert_eq!(record.display_refs.len(), 2);
    }

    #[test]
    fn attribution_moves_waiting_to_attributed() {
        let mut record = waiting_record();
        assert_eq!(record.attribution_state(), AttributionState::Waiting);
        record.apply_attribution(&AttributionUpdate {
            user_id: "mod-7".to_string(),
            reason: "cleanup".to_string(),
            backfilled: true,
            ..AttributionUpdate::default()
        });
        assert_eq!(record.attribution_state(), AttributionState::Attributed);
        assert!(!record.waiting_for_backfill);
        assert_eq!(record.reason, "cleanup");
    }

    #[test]
    fn waiting_flag_is_never_set_again() {
        let mut record = waiting_record();
        record.apply_attribution(&AttributionUpdate {
            backfilled: true,
            ..AttributionUpdate::default()
        });
        record.apply_attribution(&AttributionUpdate {
            backfilled: false,
            ..AttributionUpdate::default()
        });
        assert!(!record.waiting_for_backfill);
        assert_eq!(record.attribution_state(), AttributionState::Unattributed);
    }

    #[test]
    fn options_merge_by_key() {
        let mut record = waiting_record();
        record.options.push(EventOption::new("channel_name", "old"));
        record.apply_attribution(&AttributionUpdate {
            options: vec![
                EventOption::new("channel_name", "general"),
                EventOption::new("channel_overwrites", "2"),
            ],
            ..AttributionUpdate::default()
        });
        assert_eq!(
            record.options,
            vec![
                EventOption::new("channel_name", "general"),
                EventOption::new("channel_overwrites", "2"),
            ]
        );
    }

    #[test]
    fn action_names_round_trip() {
        for action in ActionType::ALL {
            assert_eq!(ActionType::from_name(action.as_str()), Some(action));
        }
        assert_eq!(ActionType::from_name("message_delete"), None);
    }
}
