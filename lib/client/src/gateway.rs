//! The client-side gate in front of every API call.
//!
//! Before a request: read the persisted identity fresh, check that its
//! bearer credential is still inside the validity window, and produce the
//! `Authorization` header. After a response: a 401 evicts the identity.
//! Either way the next request sees the eviction.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use study_sync_core::credential;
use tracing::{debug, info};

use crate::error::ClientError;
use crate::store::{ClientIdentityStore, Persisted, load_identity};

/// Status code that evicts the persisted identity.
pub const UNAUTHORIZED: u16 = 401;

#[derive(Clone)]
pub struct RequestGateway {
    store: Arc<dyn ClientIdentityStore>,
}

impl RequestGateway {
    pub fn new(store: Arc<dyn ClientIdentityStore>) -> Self {
        Self { store }
    }

    /// The `Authorization` header value for a request sent at `now`.
    ///
    /// `Ok(None)` when there is nothing to attach: no identity, or an
    /// identity established through the session cookie alone.
    ///
    /// # Errors
    ///
    /// [`ClientError::NotAuthenticated`] when the stored credential is
    /// expired or malformed. The identity is evicted first, and the request
    /// must not be sent.
    pub fn authorize(&self, now: DateTime<Utc>) -> Result<Option<String>, ClientError> {
        let identity = match load_identity(self.store.as_ref()) {
            Persisted::Empty => return Ok(None),
            Persisted::Corrupt => {
                self.evict("persisted identity is corrupt");
                return Err(ClientError::NotAuthenticated);
            }
            Persisted::Valid(identity) => identity,
        };

        let Some(token) = identity.token() else {
            return Ok(None);
        };

        match credential::read_claims(token) {
            Ok(claims) if claims.is_fresh(now) => Ok(Some(format!("Bearer {token}"))),
            Ok(_) => {
                self.evict("bearer credential expired");
                Err(ClientError::NotAuthenticated)
            }
            Err(e) => {
                debug!(error = %e, "stored bearer credential does not decode");
                self.evict("bearer credential malformed");
                Err(ClientError::NotAuthenticated)
            }
        }
    }

    /// Reacts to a response status. Returns whether the identity was evicted.
    pub fn observe(&self, status: u16) -> bool {
        if status == UNAUTHORIZED {
            self.evict("server rejected the request as unauthenticated");
            true
        } else {
            false
        }
    }

    fn evict(&self, reason: &str) {
        info!(reason, "evicting stored identity");
        self.store.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryIdentityStore;
    use chrono::Duration;
    use study_sync_core::{CredentialClaims, DeliveredIdentity, UserId};

    fn store_with_token_issued(issued_at: DateTime<Utc>) -> Arc<MemoryIdentityStore> {
        let id = UserId::new();
        let payload = CredentialClaims::new(id.to_string(), None, issued_at).encode_payload();
        let identity = DeliveredIdentity {
            id: id.to_string(),
            display_name: "Ann".into(),
            email: None,
            image: None,
            token: Some(format!("{payload}.c2lnbmF0dXJl")),
        };
        Arc::new(MemoryIdentityStore::holding(identity.to_json()))
    }

    #[test]
    fn fresh_credential_yields_a_bearer_header() {
        let now = Utc::now();
        let store = store_with_token_issued(now - Duration::hours(1));
        let gateway = RequestGateway::new(store.clone());

        let header = gateway.authorize(now).expect("authorized").expect("header");
        assert!(header.starts_with("Bearer "));
        assert!(store.get().is_some());
    }

    #[test]
    fn expired_credential_is_evicted_before_sending() {
        let now = Utc::now();
        let store = store_with_token_issued(now - Duration::hours(24) - Duration::minutes(1));
        let gateway = RequestGateway::new(store.clone());

        assert_eq!(gateway.authorize(now), Err(ClientError::NotAuthenticated));
        assert!(store.get().is_none());
    }

    #[test]
    fn malformed_credential_is_evicted() {
        let identity = DeliveredIdentity {
            id: UserId::new().to_string(),
            display_name: "Ann".into(),
            email: None,
            image: None,
            token: Some("garbage".into()),
        };
        let store = Arc::new(MemoryIdentityStore::holding(identity.to_json()));
        let gateway = RequestGateway::new(store.clone());

        assert_eq!(gateway.authorize(Utc::now()), Err(ClientError::NotAuthenticated));
        assert!(store.get().is_none());
    }

    #[test]
    fn session_only_identity_sends_no_header() {
        let identity = DeliveredIdentity {
            id: UserId::new().to_string(),
            display_name: "Ann".into(),
            email: None,
            image: None,
            token: None,
        };
        let store = Arc::new(MemoryIdentityStore::holding(identity.to_json()));
        let gateway = RequestGateway::new(store.clone());

        assert_eq!(gateway.authorize(Utc::now()), Ok(None));
        assert!(store.get().is_some());
    }

    #[test]
    fn no_identity_sends_no_header() {
        let gateway = RequestGateway::new(Arc::new(MemoryIdentityStore::new()));
        assert_eq!(gateway.authorize(Utc::now()), Ok(None));
    }

    #[test]
    fn unauthorized_response_evicts() {
        let now = Utc::now();
        let store = store_with_token_issued(now);
        let gateway = RequestGateway::new(store.clone());

        assert!(!gateway.observe(200));
        assert!(store.get().is_some());
        assert!(gateway.observe(401));
        assert!(store.get().is_none());
    }

    #[test]
    fn eviction_is_seen_by_the_next_request() {
        let now = Utc::now();
        let store = store_with_token_issued(now);
        let gateway = RequestGateway::new(store.clone());
        let other_handle = gateway.clone();

        other_handle.observe(401);
        assert_eq!(gateway.authorize(now), Ok(None));
    }
}
