//! Displayable representation of an event record.

use serde::{Deserialize, Serialize};

/// Rich message body posted to a display surface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    /// `"<action>: #<target> (<target type>)"`.
    pub title: String,
    /// RFC 3339 event time.
    pub timestamp: String,
    /// Ordered fields.
    pub fields: Vec<EmbedField>,
    /// Actor block, present when the record is attributed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<EmbedAuthor>,
}

/// One name/value row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    /// Field label.
    pub name: String,
    /// Field body.
    pub value: String,
}

/// Actor shown at the top of the embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedAuthor {
    /// Display name.
    pub name: String,
    /// Avatar image URL.
    pub icon_url: String,
}
