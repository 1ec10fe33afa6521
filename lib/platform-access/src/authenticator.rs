//! The request authenticator.
//!
//! Every protected operation goes through [`Authenticator::authenticate`],
//! which tries the presented proofs in a fixed order and stops at the first
//! one that resolves:
//!
//! 1. session cookie: an unknown or expired session falls through;
//! 2. bearer credential: its verdict is final (accept, invalid, malformed,
//!    or expired);
//! 3. nothing resolved: not logged in.
//!
//! No state is kept between requests.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::auth::{AuthContext, AuthProof, PresentedProofs};
use crate::credential::CredentialCodec;
use crate::error::AuthenticationError;
use crate::session::SessionId;
use crate::store::{SessionStore, UserDirectory};
use crate::user::User;

/// Resolves request proofs to an [`AuthContext`].
#[derive(Clone)]
pub struct Authenticator {
    sessions: Arc<dyn SessionStore>,
    users: Arc<dyn UserDirectory>,
    codec: CredentialCodec,
}

impl Authenticator {
    #[must_use]
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        users: Arc<dyn UserDirectory>,
        codec: CredentialCodec,
    ) -> Self {
        Self {
            sessions,
            users,
            codec,
        }
    }

    /// Attributes a request to a user, or says why it cannot.
    pub async fn authenticate(
        &self,
        presented: PresentedProofs,
        now: DateTime<Utc>,
    ) -> Result<AuthContext, AuthenticationError> {
        for proof in presented.in_order() {
            let kind = proof.kind();
            match proof {
                AuthProof::Session(id) => {
                    if let Some(user) = self.session_user(&id, now).await? {
                        debug!(user_id = %user.id(), "authenticated by session");
                        return Ok(AuthContext::new(
                            user.id(),
                            user.email().map(str::to_string),
                            kind,
                        ));
                    }
                }
                AuthProof::Bearer(token) => {
                    let verified = self.codec.verify(&token, now).map_err(|e| {
                        debug!(reason = %e, "bearer credential refused");
                        AuthenticationError::from(e)
                    })?;
                    debug!(user_id = %verified.user_id, "authenticated by bearer credential");
                    return Ok(AuthContext::new(verified.user_id, verified.email, kind));
                }
            }
        }
        Err(AuthenticationError::NotLoggedIn)
    }

    /// Resolves a session reference to its user.
    ///
    /// Returns `Ok(None)` for unknown or expired sessions and for sessions
    /// whose user no longer resolves. Expired sessions are removed.
    pub async fn session_user(
        &self,
        id: &SessionId,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, AuthenticationError> {
        let Some(session) = self.sessions.find(id).await.map_err(|e| {
            warn!(error = %e, "session lookup failed");
            AuthenticationError::Store {
                details: e.to_string(),
            }
        })?
        else {
            return Ok(None);
        };

        if session.is_expired_at(now) {
            debug!(session_id = %id, "session expired");
            if let Err(e) = self.sessions.destroy(id).await {
                warn!(error = %e, session_id = %id, "failed to remove expired session");
            }
            return Ok(None);
        }

        self.users
            .find_by_id(session.user_id())
            .await
            .map_err(|e| {
                warn!(error = %e, "user lookup for session failed");
                AuthenticationError::Store {
                    details: e.to_string(),
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::ProofKind;
    use crate::memory::{MemorySessionStore, MemoryUserDirectory};
    use crate::provider::ProviderIdentity;
    use crate::session::Session;
    use base64::Engine;
    use chrono::Duration;
    use study_sync_core::UserId;

    struct Fixture {
        sessions: Arc<MemorySessionStore>,
        users: Arc<MemoryUserDirectory>,
        codec: CredentialCodec,
        authenticator: Authenticator,
    }

    fn fixture() -> Fixture {
        let sessions = Arc::new(MemorySessionStore::new());
        let users = Arc::new(MemoryUserDirectory::new());
        let codec = CredentialCodec::new("authenticator-tests");
        let authenticator = Authenticator::new(sessions.clone(), users.clone(), codec.clone());
        Fixture {
            sessions,
            users,
            codec,
            authenticator,
        }
    }

    async fn user(f: &Fixture, external_id: &str) -> User {
        f.users
            .resolve_or_create(
                &ProviderIdentity::new(external_id, "Ann").with_email(Some("ann@example.com".into())),
            )
            .await
            .expect("user")
    }

    fn bearer(token: &str) -> PresentedProofs {
        PresentedProofs {
            session: None,
            bearer: Some(token.to_string()),
        }
    }

    #[tokio::test]
    async fn session_resolves_to_the_user_it_was_created_for() {
        let f = fixture();
        let ann = user(&f, "g-ann").await;
        let session = Session::new(SessionId::generate(), ann.id(), Duration::hours(1));
        f.sessions.create(&session).await.expect("session");

        let ctx = f
            .authenticator
            .authenticate(
                PresentedProofs {
                    session: Some(session.id().clone()),
                    bearer: None,
                },
                Utc::now(),
            )
            .await
            .expect("authenticated");

        assert_eq!(ctx.user_id(), ann.id());
        assert_eq!(ctx.email(), "ann@example.com");
        assert_eq!(ctx.proof(), ProofKind::Session);
    }

    #[tokio::test]
    async fn fresh_bearer_credential_is_accepted() {
        let f = fixture();
        let user_id = UserId::new();
        let now = Utc::now();
        let token = f.codec.mint(user_id, None, now);

        let ctx = f.authenticator.authenticate(bearer(&token), now).await.expect("ok");
        assert_eq!(ctx.user_id(), user_id);
        assert_eq!(ctx.email(), "unknown@email.com");
        assert_eq!(ctx.proof(), ProofKind::Bearer);
    }

    #[tokio::test]
    async fn window_boundary_scenario() {
        let f = fixture();
        let user_id = UserId::new();
        let now = Utc::now();

        let recent = f.codec.mint(user_id, None, now - Duration::hours(23) - Duration::minutes(59));
        assert!(f.authenticator.authenticate(bearer(&recent), now).await.is_ok());

        let stale = f.codec.mint(user_id, None, now - Duration::hours(24) - Duration::minutes(1));
        let err = f.authenticator.authenticate(bearer(&stale), now).await.unwrap_err();
        assert_eq!(err, AuthenticationError::TokenExpired);
        assert_eq!(err.client_message(), "Token expired, please log in again");
    }

    #[tokio::test]
    async fn credential_older_than_a_day_is_expired() {
        let f = fixture();
        let now = Utc::now();
        let token = f.codec.mint(UserId::new(), None, now - Duration::hours(25));
        assert_eq!(
            f.authenticator.authenticate(bearer(&token), now).await,
            Err(AuthenticationError::TokenExpired)
        );
    }

    #[tokio::test]
    async fn undecodable_credentials_are_invalid_tokens() {
        let f = fixture();
        for token in ["garbage", "bm90IGpzb24.c2ln", ""] {
            assert_eq!(
                f.authenticator.authenticate(bearer(token), Utc::now()).await,
                Err(AuthenticationError::InvalidToken),
                "token {token:?}"
            );
        }
    }

    #[tokio::test]
    async fn legacy_credential_without_id_is_invalid_format() {
        let sessions = Arc::new(MemorySessionStore::new());
        let users = Arc::new(MemoryUserDirectory::new());
        let codec = CredentialCodec::new("k").accepting_unsigned(true);
        let authenticator = Authenticator::new(sessions, users, codec);

        let token = base64::engine::general_purpose::STANDARD
            .encode(format!(r#"{{"email":"a@b.c","timestamp":{}}}"#, Utc::now().timestamp_millis()));
        assert_eq!(
            authenticator.authenticate(bearer(&token), Utc::now()).await,
            Err(AuthenticationError::InvalidTokenFormat)
        );
    }

    #[tokio::test]
    async fn nothing_presented_means_not_logged_in() {
        let f = fixture();
        let err = f
            .authenticator
            .authenticate(PresentedProofs::default(), Utc::now())
            .await
            .unwrap_err();
        assert_eq!(err, AuthenticationError::NotLoggedIn);
        assert_eq!(err.client_message(), "Please log in to view this resource");
    }

    #[tokio::test]
    async fn unknown_session_falls_through_to_bearer() {
        let f = fixture();
        let user_id = UserId::new();
        let now = Utc::now();
        let presented = PresentedProofs {
            session: Some(SessionId::from("no-such-session")),
            bearer: Some(f.codec.mint(user_id, None, now)),
        };

        let ctx = f.authenticator.authenticate(presented, now).await.expect("ok");
        assert_eq!(ctx.user_id(), user_id);
        assert_eq!(ctx.proof(), ProofKind::Bearer);
    }

    #[tokio::test]
    async fn unknown_session_alone_is_not_logged_in() {
        let f = fixture();
        let presented = PresentedProofs {
            session: Some(SessionId::from("no-such-session")),
            bearer: None,
        };
        assert_eq!(
            f.authenticator.authenticate(presented, Utc::now()).await,
            Err(AuthenticationError::NotLoggedIn)
        );
    }

    #[tokio::test]
    async fn valid_session_wins_over_a_bad_bearer() {
        let f = fixture();
        let ann = user(&f, "g-ann").await;
        let session = Session::new(SessionId::generate(), ann.id(), Duration::hours(1));
        f.sessions.create(&session).await.expect("session");

        let presented = PresentedProofs {
            session: Some(session.id().clone()),
            bearer: Some("garbage".to_string()),
        };
        let ctx = f.authenticator.authenticate(presented, Utc::now()).await.expect("ok");
        assert_eq!(ctx.user_id(), ann.id());
    }

    #[tokio::test]
    async fn expired_session_is_removed_and_ignored() {
        let f = fixture();
        let ann = user(&f, "g-ann").await;
        let session = Session::new(SessionId::generate(), ann.id(), Duration::seconds(-1));
        f.sessions.create(&session).await.expect("session");

        let resolved = f
            .authenticator
            .session_user(session.id(), Utc::now())
            .await
            .expect("lookup");
        assert!(resolved.is_none());
        assert!(f.sessions.find(session.id()).await.expect("find").is_none());
    }

    #[tokio::test]
    async fn issued_then_presented_round_trip() {
        let f = fixture();
        let ann = user(&f, "g-ann").await;
        let now = Utc::now();
        let token = f.codec.mint(ann.id(), ann.email().map(str::to_string), now);

        let ctx = f
            .authenticator
            .authenticate(bearer(&token), now + Duration::hours(1))
            .await
            .expect("ok");
        assert_eq!(ctx.user_id(), ann.id());
        assert_eq!(ctx.email(), "ann@example.com");
    }
}
