//! Declarative field tables and the generic field-level diff.
//!
//! Every tracked entity kind declares an ordered table of [`FieldSpec`]s.
//! [`diff_fields`] walks that table once per old/new pair and emits an
//! [`EventChange`] for every field whose extracted [`FieldValue`] differs;
//! [`snapshot_fields`] walks the same table to build the option list of
//! create/delete events. Adding a kind means adding a table, never another
//! diff routine.
//!
//! Output order is always table declaration order.

use super::entity::{Channel, Emoji, Guild, Member, Role};
use super::event_record::{EventChange, EventOption};

/// A comparable, encodable field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Free text, encoded verbatim.
    Text(String),
    /// Encoded as `yes` / `no`.
    Bool(bool),
    /// Signed integer, encoded as decimal.
    Int(i64),
    /// Unsigned integer (bit sets), encoded as decimal.
    Unsigned(u64),
    /// RGB colour, encoded as six lowercase hex digits.
    Color(u32),
    /// Already-resolved enum name; unmapped values carry `""`.
    Enum(&'static str),
    /// Multi-valued field, encoded comma-joined. Compared as a set.
    List(Vec<String>),
}

impl FieldValue {
    /// Display encoding of the value.
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Bool(flag) => encode_bool(*flag).to_string(),
            Self::Int(n) => n.to_string(),
            Self::Unsigned(n) => n.to_string(),
            Self::Color(rgb) => format!("{rgb:06x}"),
            Self::Enum(name) => (*name).to_string(),
            Self::List(items) => items.join(","),
        }
    }

    fn is_positive(&self) -> bool {
        match self {
            Self::Int(n) => *n > 0,
            Self::Unsigned(n) => *n > 0,
            Self::Color(rgb) => *rgb > 0,
            Self::List(items) => !items.is_empty(),
            Self::Text(_) | Self::Bool(_) | Self::Enum(_) => true,
        }
    }
}

/// Boolean display encoding.
#[must_use]
pub const fn encode_bool(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

/// When a field is included in a create/delete snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Always included.
    Always,
    /// Included when the encoded value is non-empty.
    NonEmpty,
    /// Included when the numeric value is greater than zero.
    Positive,
}

impl Presence {
    fn admits(self, value: &FieldValue) -> bool {
        match self {
            Self::Always => true,
            Self::NonEmpty => !value.encode().is_empty(),
            Self::Positive => value.is_positive(),
        }
    }
}

/// One row of a per-kind field table.
#[derive(Debug)]
pub struct FieldSpec<E> {
    /// Stored key, e.g. `role_hoist`.
    pub key: &'static str,
    /// Snapshot inclusion rule.
    pub presence: Presence,
    /// Extracts the comparable value from an entity.
    pub extract: fn(&E) -> FieldValue,
}

impl<E> FieldSpec<E> {
    /// Builds a table row.
    #[must_use]
    pub const fn new(key: &'static str, presence: Presence, extract: fn(&E) -> FieldValue) -> Self {
        Self {
            key,
            presence,
            extract,
        }
    }
}

/// Result of diffing one old/new pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldDiff {
    /// Differing fields in table order.
    pub changes: Vec<EventChange>,
    /// Derived `<key>_added` / `<key>_removed` entries of list fields.
    pub options: Vec<EventOption>,
}

impl FieldDiff {
    /// Whether no field differed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.options.is_empty()
    }
}

/// Diffs two snapshots of the same kind against its field table.
#[must_use]
pub fn diff_fields<E>(fields: &[FieldSpec<E>], old: &E, new: &E) -> FieldDiff {
    let mut out = FieldDiff::default();
    for field in fields {
        let before = (field.extract)(old);
        let after = (field.extract)(new);
        if before == after {
            continue;
        }

        if let (FieldValue::List(old_items), FieldValue::List(new_items)) = (&before, &after) {
            let added = missing_from(new_items, old_items);
            let removed = missing_from(old_items, new_items);
            // reordering alone is not a change
            if added.is_empty() && removed.is_empty() {
                continue;
            }
            out.changes
                .push(EventChange::new(field.key, before.encode(), after.encode()));
            if !added.is_empty() {
                out.options
                    .push(EventOption::new(format!("{}_added", field.key), added.join(",")));
            }
            if !removed.is_empty() {
                out.options.push(EventOption::new(
                    format!("{}_removed", field.key),
                    removed.join(","),
                ));
            }
            continue;
        }

        out.changes
            .push(EventChange::new(field.key, before.encode(), after.encode()));
    }
    out
}

/// Encodes every admitted field of one snapshot as options.
#[must_use]
pub fn snapshot_fields<E>(fields: &[FieldSpec<E>], entity: &E) -> Vec<EventOption> {
    fields
        .iter()
        .filter_map(|field| {
            let value = (field.extract)(entity);
            field
                .presence
                .admits(&value)
                .then(|| EventOption::new(field.key, value.encode()))
        })
        .collect()
}

/// Items of `items` that do not occur in `other`, in `items` order.
fn missing_from<'a>(items: &'a [String], other: &[String]) -> Vec<&'a str> {
    items
        .iter()
        .filter(|item| !other.contains(item))
        .map(String::as_str)
        .collect()
}

/// An entity kind with a declared field table.
pub trait TrackedEntity: Sized + 'static {
    /// The kind's field table in declaration order.
    fn fields() -> &'static [FieldSpec<Self>];

    /// Field-level diff of two snapshots.
    #[must_use]
    fn diff(old: &Self, new: &Self) -> FieldDiff {
        diff_fields(Self::fields(), old, new)
    }

    /// Option list describing this snapshot.
    #[must_use]
    fn snapshot(&self) -> Vec<EventOption> {
        snapshot_fields(Self::fields(), self)
    }
}

static CHANNEL_FIELDS: [FieldSpec<Channel>; 7] = [
    FieldSpec::new("channel_name", Presence::Always, |c: &Channel| {
        FieldValue::Text(c.name.clone())
    }),
    FieldSpec::new("channel_type", Presence::NonEmpty, |c: &Channel| {
        FieldValue::Enum(c.channel_type.name())
    }),
    FieldSpec::new("channel_topic", Presence::NonEmpty, |c: &Channel| {
        FieldValue::Text(c.topic.clone())
    }),
    FieldSpec::new("channel_nsfw", Presence::Always, |c: &Channel| {
        FieldValue::Bool(c.nsfw)
    }),
    FieldSpec::new("channel_bitrate", Presence::Positive, |c: &Channel| {
        FieldValue::Int(c.bitrate)
    }),
    FieldSpec::new("channel_position", Presence::Positive, |c: &Channel| {
        FieldValue::Int(c.position)
    }),
    FieldSpec::new("channel_parentid", Presence::Always, |c: &Channel| {
        FieldValue::Text(c.parent_id.clone())
    }),
];

static ROLE_FIELDS: [FieldSpec<Role>; 7] = [
    FieldSpec::new("role_name", Presence::Always, |r: &Role| {
        FieldValue::Text(r.name.clone())
    }),
    FieldSpec::new("role_managed", Presence::Always, |r: &Role| {
        FieldValue::Bool(r.managed)
    }),
    FieldSpec::new("role_mentionable", Presence::Always, |r: &Role| {
        FieldValue::Bool(r.mentionable)
    }),
    FieldSpec::new("role_hoist", Presence::Always, |r: &Role| {
        FieldValue::Bool(r.hoist)
    }),
    FieldSpec::new("role_color", Presence::Positive, |r: &Role| {
        FieldValue::Color(r.color)
    }),
    FieldSpec::new("role_position", Presence::Always, |r: &Role| {
        FieldValue::Int(r.position)
    }),
    FieldSpec::new("role_permissions", Presence::Always, |r: &Role| {
        FieldValue::Unsigned(r.permissions)
    }),
];

static GUILD_FIELDS: [FieldSpec<Guild>; 11] = [
    FieldSpec::new("guild_name", Presence::Always, |g: &Guild| {
        FieldValue::Text(g.name.clone())
    }),
    FieldSpec::new("guild_icon", Presence::Always, |g: &Guild| {
        FieldValue::Text(g.icon.clone())
    }),
    FieldSpec::new("guild_region", Presence::Always, |g: &Guild| {
        FieldValue::Text(g.region.clone())
    }),
    FieldSpec::new("guild_afkchannelid", Presence::Always, |g: &Guild| {
        FieldValue::Text(g.afk_channel_id.clone())
    }),
    FieldSpec::new("guild_embedchannelid", Presence::Always, |g: &Guild| {
        FieldValue::Text(g.embed_channel_id.clone())
    }),
    FieldSpec::new("guild_ownerid", Presence::Always, |g: &Guild| {
        FieldValue::Text(g.owner_id.clone())
    }),
    FieldSpec::new("guild_splash", Presence::Always, |g: &Guild| {
        FieldValue::Text(g.splash.clone())
    }),
    FieldSpec::new("guild_afktimeout", Presence::Always, |g: &Guild| {
        FieldValue::Int(g.afk_timeout)
    }),
    FieldSpec::new("guild_verificationlevel", Presence::Always, |g: &Guild| {
        FieldValue::Enum(g.verification_level.name())
    }),
    FieldSpec::new("guild_embedenabled", Presence::Always, |g: &Guild| {
        FieldValue::Bool(g.embed_enabled)
    }),
    FieldSpec::new(
        "guild_defaultmessagenotifications",
        Presence::Always,
        |g: &Guild| FieldValue::Int(g.default_message_notifications),
    ),
];

static EMOJI_FIELDS: [FieldSpec<Emoji>; 5] = [
    FieldSpec::new("emoji_name", Presence::Always, |e: &Emoji| {
        FieldValue::Text(e.name.clone())
    }),
    FieldSpec::new("emoji_managed", Presence::Always, |e: &Emoji| {
        FieldValue::Bool(e.managed)
    }),
    FieldSpec::new("emoji_requirecolons", Presence::Always, |e: &Emoji| {
        FieldValue::Bool(e.require_colons)
    }),
    FieldSpec::new("emoji_animated", Presence::Always, |e: &Emoji| {
        FieldValue::Bool(e.animated)
    }),
    FieldSpec::new("emoji_apiname", Presence::Always, |e: &Emoji| {
        FieldValue::Text(e.api_name())
    }),
];

static MEMBER_FIELDS: [FieldSpec<Member>; 3] = [
    FieldSpec::new("member_roles", Presence::Positive, |m: &Member| {
        FieldValue::List(m.roles.clone())
    }),
    FieldSpec::new("member_username", Presence::Always, |m: &Member| {
        FieldValue::Text(m.user.tag())
    }),
    FieldSpec::new("member_nick", Presence::NonEmpty, |m: &Member| {
        FieldValue::Text(m.nick.clone())
    }),
];

impl TrackedEntity for Channel {
    fn fields() -> &'static [FieldSpec<Self>] {
        &CHANNEL_FIELDS
    }
}

impl TrackedEntity for Role {
    fn fields() -> &'static [FieldSpec<Self>] {
        &ROLE_FIELDS
    }
}

impl TrackedEntity for Guild {
    fn fields() -> &'static [FieldSpec<Self>] {
        &GUILD_FIELDS
    }
}

impl TrackedEntity for Emoji {
    fn fields() -> &'static [FieldSpec<Self>] {
        &EMOJI_FIELDS
    }
}

impl TrackedEntity for Member {
    fn fields() -> &'static [FieldSpec<Self>] {
        &MEMBER_FIELDS
    }
}
