//! Credential issuance at login.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use study_sync_core::{DeliveredIdentity, Result};
use tracing::info;

use crate::credential::CredentialCodec;
use crate::error::StoreError;
use crate::session::{Session, SessionId};
use crate::store::SessionStore;
use crate::user::User;

/// Both proofs handed out for one login.
#[derive(Debug, Clone)]
pub struct IssuedCredentials {
    /// The stored session; its id goes into the `session` cookie.
    pub session: Session,
    /// The bearer credential for the client to keep.
    pub bearer: String,
}

impl IssuedCredentials {
    /// The identity payload delivered to the client on the post-login
    /// redirect.
    #[must_use]
    pub fn delivered_identity(&self, user: &User) -> DeliveredIdentity {
        DeliveredIdentity {
            id: user.id().to_string(),
            display_name: user.display_name().to_string(),
            email: user.email().map(str::to_string),
            image: user.image().map(str::to_string),
            token: Some(self.bearer.clone()),
        }
    }
}

/// Creates sessions and mints bearer credentials.
#[derive(Clone)]
pub struct CredentialIssuer {
    sessions: Arc<dyn SessionStore>,
    codec: CredentialCodec,
    session_duration: Duration,
}

impl CredentialIssuer {
    #[must_use]
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        codec: CredentialCodec,
        session_duration: Duration,
    ) -> Self {
        Self {
            sessions,
            codec,
            session_duration,
        }
    }

    /// Issues a session and a bearer credential for `user`.
    ///
    /// # Errors
    ///
    /// Fails only if the session cannot be stored; no credential is minted
    /// in that case.
    pub async fn issue(&self, user: &User) -> Result<IssuedCredentials, StoreError> {
        self.issue_at(user, Utc::now()).await
    }

    /// Like [`issue`](Self::issue) with an explicit issuance time for the
    /// bearer credential.
    pub async fn issue_at(
        &self,
        user: &User,
        now: DateTime<Utc>,
    ) -> Result<IssuedCredentials, StoreError> {
        let session = Session::new(SessionId::generate(), user.id(), self.session_duration);
        self.sessions.create(&session).await?;

        let bearer = self
            .codec
            .mint(user.id(), user.email().map(str::to_string), now);

        info!(user_id = %user.id(), session_id = %session.id(), "issued credentials");
        Ok(IssuedCredentials { session, bearer })
    }

    /// The codec used for minting.
    #[must_use]
    pub fn codec(&self) -> &CredentialCodec {
        &self.codec
    }
}
