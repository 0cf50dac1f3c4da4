//! Shared DTO types used across multiple endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{EventChange, EventOption};

/// Default number of items returned by list endpoints.
pub const DEFAULT_LIMIT: usize = 50;

/// Upper bound for `limit`.
pub const MAX_LIMIT: usize = 500;

/// Limit query parameter for list endpoints.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct LimitParams {
    /// Maximum number of items (1–500). Defaults to 50.
    #[serde(default)]
    pub limit: Option<usize>,
}

impl LimitParams {
    /// Returns the requested limit clamped to `1..=MAX_LIMIT`.
    #[must_use]
    pub fn clamped(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

/// Before/after pair of a changed field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ChangeDto {
    /// Field key.
    pub key: String,
    /// Encoded old value.
    pub old_value: String,
    /// Encoded new value.
    pub new_value: String,
}

impl From<EventChange> for ChangeDto {
    fn from(change: EventChange) -> Self {
        Self {
            key: change.key,
            old_value: change.old_value,
            new_value: change.new_value,
        }
    }
}

/// Key/value context entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OptionDto {
    /// Option key.
    pub key: String,
    /// Encoded value.
    pub value: String,
}

impl From<EventOption> for OptionDto {
    fn from(option: EventOption) -> Self {
        Self {
            key: option.key,
            value: option.value,
        }
    }
}

impl From<OptionDto> for EventOption {
    fn from(option: OptionDto) -> Self {
        Self::new(option.key, option.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_is_clamped() {
        assert_eq!(LimitParams::default().clamped(), DEFAULT_LIMIT);
        assert_eq!(LimitParams { limit: Some(0) }.clamped(), 1);
        assert_eq!(LimitParams { limit: Some(10_000) }.clamped(), MAX_LIMIT);
    }
}
