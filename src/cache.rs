//! Read-through user snapshot cache with a fixed TTL.
//!
//! Exists to keep connection authentication from hammering the directory;
//! never the source of truth. Entries are not invalidated on user mutation,
//! so a snapshot can be stale for up to one TTL. Process-scoped: constructed
//! at startup and injected through `AppState`.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::modules::chat::model::UserRecord;
use crate::store::DirectoryStore;

pub struct UserCache {
    ttl: Duration,
    entries: RwLock<HashMap<Uuid, (UserRecord, Instant)>>,
}

impl UserCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the cached snapshot if fresh, otherwise fetches from the
    /// directory and caches the result. Missing users are not negative-cached.
    pub async fn get_or_fetch(
        &self,
        directory: &dyn DirectoryStore,
        user_id: Uuid,
    ) -> anyhow::Result<Option<UserRecord>> {
        if let Some((user, fetched_at)) = self.entries.read().await.get(&user_id) {
            if fetched_at.elapsed() < self.ttl {
                return Ok(Some(user.clone()));
            }
        }

        let Some(user) = directory.find_user_by_id(user_id).await? else {
            return Ok(None);
        };
        self.entries
            .write()
            .await
            .insert(user_id, (user.clone(), Instant::now()));
        Ok(Some(user))
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::chat::model::Role;
    use crate::store::memory::MemoryDirectoryStore;

    #[tokio::test]
    async fn caches_within_ttl() {
        let directory = MemoryDirectoryStore::new();
        let user = directory.add_user("rena", Role::Teacher, true);
        let cache = UserCache::new(Duration::from_secs(300));

        let first = cache.get_or_fetch(&directory, user.id).await.unwrap();
        assert!(first.is_some());

        // Mutation is invisible until the entry expires.
        directory.deactivate(user.id);
        let second = cache.get_or_fetch(&directory, user.id).await.unwrap().unwrap();
        assert!(second.active);
    }

    #[tokio::test]
    async fn refetches_after_expiry() {
        let directory = MemoryDirectoryStore::new();
        let user = directory.add_user("rena", Role::Teacher, true);
        let cache = UserCache::new(Duration::ZERO);

        cache.get_or_fetch(&directory, user.id).await.unwrap();
        directory.deactivate(user.id);
        let refreshed = cache.get_or_fetch(&directory, user.id).await.unwrap().unwrap();
        assert!(!refreshed.active);
    }

    #[tokio::test]
    async fn unknown_user_is_none_and_not_cached() {
        let directory = MemoryDirectoryStore::new();
        let cache = UserCache::new(Duration::from_secs(300));

        let missing = cache.get_or_fetch(&directory, Uuid::new_v4()).await.unwrap();
        assert!(missing.is_none());
        assert!(cache.is_empty().await);
    }
}
