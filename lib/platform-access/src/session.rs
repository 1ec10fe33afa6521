//! Server-side sessions.
//!
//! A session correlates an opaque identifier, carried in the `session`
//! cookie, with a local user. Sessions are created at login, destroyed at
//! logout, and ignored once past `expires_at`.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use study_sync_core::UserId;

/// Opaque session handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    #[must_use]
    pub fn new(id: String) -> Self {
        Self(id)
    }

    /// Generates an unguessable identifier for a new session.
    #[must_use]
    pub fn generate() -> Self {
        Self(ulid::Ulid::new().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A live login of one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    id: SessionId,
    user_id: UserId,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl Session {
    /// Opens a session for `user_id` lasting `duration` from now.
    #[must_use]
    pub fn new(id: SessionId, user_id: UserId, duration: Duration) -> Self {
        let now = Utc::now();
        Self {
            id,
            user_id,
            created_at: now,
            expires_at: now + duration,
        }
    }

    /// Reconstitutes a session from storage.
    #[must_use]
    pub fn with_all_fields(
        id: SessionId,
        user_id: UserId,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            created_at,
            expires_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// True once `now` has reached `expires_at`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_distinct() {
        assert_ne!(SessionId::generate(), SessionId::generate());
    }

    #[test]
    fn new_session_is_live_for_its_duration() {
        let user_id = UserId::new();
        let session = Session::new(SessionId::generate(), user_id, Duration::hours(1));

        assert_eq!(session.user_id(), user_id);
        assert!(!session.is_expired());
        assert_eq!(session.expires_at() - session.created_at(), Duration::hours(1));
        assert!(session.is_expired_at(session.created_at() + Duration::hours(1)));
    }

    #[test]
    fn negative_duration_is_already_expired() {
        let session = Session::new(SessionId::generate(), UserId::new(), Duration::seconds(-1));
        assert!(session.is_expired());
    }
}
