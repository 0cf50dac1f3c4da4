//! Pure rendering of event records.
//!
//! [`render`] has no side effects and performs no lookups: the caller
//! resolves the actor beforehand and passes the result in, so the same
//! function serves the first publish and every later refresh.

use chrono::SecondsFormat;

use super::embed::{Embed, EmbedAuthor, EmbedField};
use crate::domain::{EventRecord, User};

/// Name shown when the actor cannot be resolved.
pub const UNKNOWN_AUTHOR: &str = "N/A";

/// Avatar size requested for the author block.
const AVATAR_SIZE: u32 = 64;

/// Renders a record.
///
/// `author` is the resolved profile of `record.user_id`; `None` means the
/// lookup failed and degrades to the [`UNKNOWN_AUTHOR`] placeholder. It is
/// ignored when the record has no actor.
#[must_use]
pub fn render(record: &EventRecord, author: Option<&User>) -> Embed {
    let mut fields = Vec::with_capacity(record.changes.len() + record.options.len() + 1);

    if !record.reason.is_empty() {
        fields.push(EmbedField {
            name: "Reason".to_string(),
            value: record.reason.clone(),
        });
    }
    fields.extend(record.changes.iter().map(|change| EmbedField {
        name: change.key.clone(),
        value: format!("{} ➡ {}", change.old_value, change.new_value),
    }));
    fields.extend(record.options.iter().map(|option| EmbedField {
        name: option.key.clone(),
        value: option.value.clone(),
    }));

    let author = (!record.user_id.is_empty()).then(|| match author {
        Some(user) => EmbedAuthor {
            name: user.username.clone(),
            icon_url: user.avatar_url(AVATAR_SIZE),
        },
        None => EmbedAuthor {
            name: UNKNOWN_AUTHOR.to_string(),
            icon_url: User::default().avatar_url(AVATAR_SIZE),
        },
    });

    Embed {
        title: format!(
            "{}: #{} ({})",
            record.action_type, record.target_id, record.target_type
        ),
        timestamp: record.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        fields,
        author,
    }
}
