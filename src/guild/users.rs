//! In-process user directory fed by member notifications.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::UserDirectory;
use crate::domain::User;
use crate::error::EventlogError;

/// [`UserDirectory`] over the users seen so far.
#[derive(Debug, Default)]
pub struct CachedUserDirectory {
    users: RwLock<HashMap<String, User>>,
}

impl CachedUserDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores or refreshes a user profile. Users without an id are ignored.
    pub async fn remember(&self, user: &User) {
        if user.id.is_empty() {
            return;
        }
        self.users
            .write()
            .await
            .insert(user.id.clone(), user.clone());
    }

    /// Number of cached users.
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    /// Whether no user has been cached.
    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl UserDirectory for CachedUserDirectory {
    async fn resolve(&self, user_id: &str) -> Result<User, EventlogError> {
        self.users
            .read()
            .await
            .get(user_id)
            .cloned()
            .ok_or_else(|| EventlogError::InvalidRequest(format!("unknown user: {user_id}")))
    }
}
