//! Startup reconciliation of the client identity.
//!
//! At most three sources can say who is signed in. They are consulted in a
//! fixed order, and the first that answers wins:
//!
//! 1. the `user` query parameter of the post-login redirect;
//! 2. the identity persisted by an earlier visit;
//! 3. a session probe against the server (cookies only).
//!
//! Finding no identity is not an error: it is the signal to show the login
//! screen.

use async_trait::async_trait;
use futures::lock::Mutex;
use std::sync::Arc;
use study_sync_core::{DeliveredIdentity, USER_QUERY_PARAM};
use tracing::{debug, warn};
use url::Url;

use crate::error::ClientError;
use crate::store::{ClientIdentityStore, Persisted, load_identity};

/// Asks the server who the current session belongs to.
#[async_trait(?Send)]
pub trait SessionProbe {
    /// `Ok(None)` means the server knows no session for this browser.
    async fn probe(&self) -> Result<Option<DeliveredIdentity>, ClientError>;
}

/// Result of a reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Who is signed in, if anyone.
    pub identity: Option<DeliveredIdentity>,
    /// The current URL without the `user` parameter, when it carried one.
    /// The caller should replace the address bar with it.
    pub cleaned_url: Option<String>,
}

/// Splits the delivered identity off a URL.
///
/// Returns the raw parameter value and the URL without it. Other
/// parameters and the fragment are kept; an emptied query is dropped.
#[must_use]
pub fn take_delivered_identity(url: &Url) -> Option<(String, Url)> {
    let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    let raw = pairs
        .iter()
        .find(|(key, _)| key == USER_QUERY_PARAM)
        .map(|(_, value)| value.clone())?;

    let rest: Vec<&(String, String)> = pairs
        .iter()
        .filter(|(key, _)| key != USER_QUERY_PARAM)
        .collect();

    let mut cleaned = url.clone();
    if rest.is_empty() {
        cleaned.set_query(None);
    } else {
        cleaned
            .query_pairs_mut()
            .clear()
            .extend_pairs(rest.into_iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }
    Some((raw, cleaned))
}

/// Runs reconciliation once and remembers the outcome.
pub struct Reconciler<P> {
    store: Arc<dyn ClientIdentityStore>,
    probe: P,
    outcome: Mutex<Option<Reconciliation>>,
}

impl<P: SessionProbe> Reconciler<P> {
    pub fn new(store: Arc<dyn ClientIdentityStore>, probe: P) -> Self {
        Self {
            store,
            probe,
            outcome: Mutex::new(None),
        }
    }

    /// Reconciles against `current_url`.
    ///
    /// Concurrent calls wait for the first one; every call returns that
    /// first outcome.
    pub async fn run(&self, current_url: &str) -> Reconciliation {
        let mut outcome = self.outcome.lock().await;
        if let Some(done) = outcome.as_ref() {
            return done.clone();
        }
        let fresh = self.reconcile(current_url).await;
        *outcome = Some(fresh.clone());
        fresh
    }

    async fn reconcile(&self, current_url: &str) -> Reconciliation {
        let delivered = Url::parse(current_url)
            .ok()
            .and_then(|url| take_delivered_identity(&url));

        if let Some((raw, cleaned)) = delivered {
            let cleaned_url = Some(cleaned.to_string());
            return match DeliveredIdentity::from_json(&raw) {
                Ok(identity) => {
                    debug!(user_id = %identity.id, "identity delivered on redirect");
                    self.store.set(&raw);
                    Reconciliation {
                        identity: Some(identity),
                        cleaned_url,
                    }
                }
                Err(e) => {
                    warn!(error = %e, "delivered identity does not decode");
                    self.store.clear();
                    Reconciliation {
                        identity: None,
                        cleaned_url,
                    }
                }
            };
        }

        match load_identity(self.store.as_ref()) {
            Persisted::Valid(identity) => {
                return Reconciliation {
                    identity: Some(identity),
                    cleaned_url: None,
                };
            }
            Persisted::Corrupt => self.store.clear(),
            Persisted::Empty => {}
        }

        let identity = match self.probe.probe().await {
            Ok(Some(identity)) => {
                debug!(user_id = %identity.id, "session probe found a user");
                let session_only = DeliveredIdentity {
                    token: None,
                    ..identity
                };
                self.store.set(&session_only.to_json());
                Some(session_only)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "session probe failed");
                self.store.clear();
                None
            }
        };

        Reconciliation {
            identity,
            cleaned_url: None,
        }
    }
}
