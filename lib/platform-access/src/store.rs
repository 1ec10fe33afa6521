//! Storage seams for users and sessions.
//!
//! The server backs these with Postgres; [`crate::memory`] provides
//! in-process implementations used by tests.

use async_trait::async_trait;
use study_sync_core::{Result, UserId};

use crate::error::StoreError;
use crate::provider::ProviderIdentity;
use crate::session::{Session, SessionId};
use crate::user::User;

/// Durable mapping from external identities to local users.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Returns the user for `identity.external_id`, creating it on first
    /// sight.
    ///
    /// An existing record is returned unchanged even if the provider now
    /// reports different profile fields. Implementations must make this
    /// atomic: concurrent calls for one external identity yield one record.
    async fn resolve_or_create(&self, identity: &ProviderIdentity) -> Result<User, StoreError>;

    /// Looks a user up by local identifier.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Looks several users up at once. Unknown ids are skipped.
    async fn find_by_ids(&self, ids: &[UserId]) -> Result<Vec<User>, StoreError> {
        let mut found = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(user) = self.find_by_id(*id).await? {
                found.push(user);
            }
        }
        Ok(found)
    }
}

/// Server-side session storage.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, session: &Session) -> Result<(), StoreError>;

    async fn find(&self, id: &SessionId) -> Result<Option<Session>, StoreError>;

    /// Removes a session. Removing an unknown session is not an error.
    async fn destroy(&self, id: &SessionId) -> Result<(), StoreError>;

    /// Removes every expired session, returning how many were removed.
    async fn purge_expired(&self) -> Result<u64, StoreError>;
}
