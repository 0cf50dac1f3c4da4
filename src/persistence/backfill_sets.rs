//! Set store behind the backfill request queue.
//!
//! One named set per backfill kind, each holding guild ids. The trait
//! mirrors the small subset of a key/value server's set commands the
//! queue needs; [`InMemoryBackfillSets`] implements it in-process.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::EventlogError;

/// Named sets of guild ids.
#[async_trait]
pub trait BackfillSetStore: Send + Sync + fmt::Debug {
    /// Adds `member` to `set`. Returns `true` if it was not present.
    ///
    /// # Errors
    ///
    /// Returns [`EventlogError::BackfillTransport`] when the store cannot
    /// be reached.
    async fn add(&self, set: &str, member: &str) -> Result<bool, EventlogError>;

    /// Removes and returns every member of `set`.
    ///
    /// # Errors
    ///
    /// Returns [`EventlogError::BackfillTransport`] when the store cannot
    /// be reached.
    async fn drain(&self, set: &str) -> Result<Vec<String>, EventlogError>;

    /// Returns the members of `set` without removing them.
    ///
    /// # Errors
    ///
    /// Returns [`EventlogError::BackfillTransport`] when the store cannot
    /// be reached.
    async fn members(&self, set: &str) -> Result<Vec<String>, EventlogError>;
}

/// Process-local [`BackfillSetStore`].
#[derive(Debug, Default)]
pub struct InMemoryBackfillSets {
    sets: Mutex<HashMap<String, BTreeSet<String>>>,
}

impl InMemoryBackfillSets {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BackfillSetStore for InMemoryBackfillSets {
    async fn add(&self, set: &str, member: &str) -> Result<bool, EventlogError> {
        let mut sets = self.sets.lock().await;
        Ok(sets
            .entry(set.to_string())
            .or_default()
            .insert(member.to_string()))
    }

    async fn drain(&self, set: &str) -> Result<Vec<String>, EventlogError> {
        let mut sets = self.sets.lock().await;
        Ok(sets
            .remove(set)
            .map(|members| members.into_iter().collect())
            .unwrap_or_default())
    }

    async fn members(&self, set: &str) -> Result<Vec<String>, EventlogError> {
        let sets = self.sets.lock().await;
        Ok(sets
            .get(set)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn add_is_idempotent() {
        let sets = InMemoryBackfillSets::new();
        assert!(matches!(sets.add("s", "g1").await, Ok(true)));
        assert!(matches!(sets.add("s", "g1").await, Ok(false)));
        assert_eq!(sets.members("s").await.ok(), Some(vec!["g1".to_string()]));
    }

    #[tokio::test]
    async fn drain_empties_the_set() {
        let sets = InMemoryBackfillSets::new();
        let _ = sets.add("s", "g2").await;
        let _ = sets.add("s", "g1").await;
        assert_eq!(
            sets.drain("s").await.ok(),
            Some(vec!["g1".to_string(), "g2".to_string()])
        );
        assert_eq!(sets.members("s").await.ok(), Some(Vec::new()));
    }

    #[tokio::test]
    async fn sets_are_independent() {
        let sets = InMemoryBackfillSets::new();
        let _ = sets.add("a", "g1").await;
        assert_eq!(sets.drain("b").await.ok(), Some(Vec::new()));
        assert_eq!(sets.members("a").await.ok(), Some(vec!["g1".to_string()]));
    }
}
