//! In-process user and session stores.
//!
//! Used by tests and local tooling in place of the database.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use study_sync_core::{Result, UserId};
use tokio::sync::{Mutex, RwLock};

use crate::error::StoreError;
use crate::provider::ProviderIdentity;
use crate::session::{Session, SessionId};
use crate::store::{SessionStore, UserDirectory};
use crate::user::User;

/// Users keyed by external identifier.
#[derive(Debug, Default)]
pub struct MemoryUserDirectory {
    users: Mutex<HashMap<String, User>>,
}

impl MemoryUserDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users.
    pub async fn len(&self) -> usize {
        self.users.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.lock().await.is_empty()
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn resolve_or_create(&self, identity: &ProviderIdentity) -> Result<User, StoreError> {
        // One lock across lookup and insert keeps first logins atomic.
        let mut users = self.users.lock().await;
        let user = users
            .entry(identity.external_id.clone())
            .or_insert_with(|| User::from_identity(identity));
        Ok(user.clone())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let users = self.users.lock().await;
        Ok(users.values().find(|u| u.id() == id).cloned())
    }
}

/// Sessions keyed by session identifier.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, session: &Session) -> Result<(), StoreError> {
        self.sessions
            .write()
            .await
            .insert(session.id().clone(), session.clone());
        Ok(())
    }

    async fn find(&self, id: &SessionId) -> Result<Option<Session>, StoreError> {
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn destroy(&self, id: &SessionId) -> Result<(), StoreError> {
        self.sessions.write().await.remove(id);
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64, StoreError> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired_at(now));
        Ok((before - sessions.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::Arc;

    #[tokio::test]
    async fn resolve_or_create_is_idempotent_per_external_id() {
        let directory = MemoryUserDirectory::new();
        let identity = ProviderIdentity::new("g-123", "Ann");

        let first = directory.resolve_or_create(&identity).await.expect("first");
        let second = directory.resolve_or_create(&identity).await.expect("second");

        assert_eq!(first.id(), second.id());
        assert_eq!(directory.len().await, 1);
    }

    #[tokio::test]
    async fn later_logins_do_not_refresh_the_profile() {
        let directory = MemoryUserDirectory::new();
        let first = directory
            .resolve_or_create(
                &ProviderIdentity::new("g-123", "Ann").with_image(Some("http://x/a.png".into())),
            )
            .await
            .expect("first");

        let again = directory
            .resolve_or_create(&ProviderIdentity::new("g-123", "Annie"))
            .await
            .expect("again");

        assert_eq!(again, first);
        assert_eq!(again.display_name(), "Ann");
        assert_eq!(again.image(), Some("http://x/a.png"));
    }

    #[tokio::test]
    async fn concurrent_first_logins_create_one_record() {
        let directory = Arc::new(MemoryUserDirectory::new());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let directory = Arc::clone(&directory);
                tokio::spawn(async move {
                    directory
                        .resolve_or_create(&ProviderIdentity::new("g-race", "Racer"))
                        .await
                        .expect("resolve")
                        .id()
                })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.expect("join"));
        }
        ids.dedup();
        assert_eq!(ids.len(), 1);
        assert_eq!(directory.len().await, 1);
    }

    #[tokio::test]
    async fn find_by_id_sees_created_users() {
        let directory = MemoryUserDirectory::new();
        let user = directory
            .resolve_or_create(&ProviderIdentity::new("g-1", "One"))
            .await
            .expect("create");

        assert_eq!(directory.find_by_id(user.id()).await.expect("find"), Some(user));
        assert_eq!(directory.find_by_id(UserId::new()).await.expect("find"), None);
    }

    #[tokio::test]
    async fn sessions_can_be_created_found_and_destroyed() {
        let store = MemorySessionStore::new();
        let session = Session::new(SessionId::generate(), UserId::new(), Duration::hours(1));

        store.create(&session).await.expect("create");
        assert_eq!(store.find(session.id()).await.expect("find"), Some(session.clone()));

        store.destroy(session.id()).await.expect("destroy");
        assert_eq!(store.find(session.id()).await.expect("find"), None);
        store.destroy(session.id()).await.expect("destroying twice is fine");
    }

    #[tokio::test]
    async fn purge_removes_only_expired_sessions() {
        let store = MemorySessionStore::new();
        let live = Session::new(SessionId::generate(), UserId::new(), Duration::hours(1));
        let dead = Session::new(SessionId::generate(), UserId::new(), Duration::seconds(-1));
        store.create(&live).await.expect("live");
        store.create(&dead).await.expect("dead");

        assert_eq!(store.purge_expired().await.expect("purge"), 1);
        assert!(store.find(live.id()).await.expect("find").is_some());
        assert!(store.find(dead.id()).await.expect("find").is_none());
    }
}
