//! Authentication for the study-sync server.
//!
//! This module provides:
//! - The OIDC identity provider adapter
//! - Postgres-backed users and sessions
//! - The `RequireAuth` extractor (session first, then bearer credential)
//! - Login, callback, logout and current-user routes
//!
//! Login hands out two proofs: a `session` cookie and a signed bearer
//! credential delivered to the client on the post-login redirect. Either is
//! accepted on protected routes.

pub mod db;
pub mod middleware;
pub mod oidc;
pub mod routes;

use chrono::Duration;
use sqlx::PgPool;
use std::sync::Arc;
use study_sync_content::{
    FileStorage, MemoryFileStorage, MemoryPostStore, MemoryResourceStore, PostStore, ResourceStore,
};
use study_sync_platform_access::{
    Authenticator, CredentialCodec, CredentialIssuer, IdentityProvider, MemorySessionStore,
    MemoryUserDirectory, SessionStore, UserDirectory,
};

use crate::config::SessionConfig;
use crate::db::{PgPostStore, PgResourceStore};
use db::{PgSessionStore, PgUserDirectory};

pub use middleware::{AuthRejection, RequireAuth, SESSION_COOKIE};
pub use oidc::OidcProvider;
pub use routes::{callback, current_user, login, logout};

/// Every store the server reads or writes.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserDirectory>,
    pub sessions: Arc<dyn SessionStore>,
    pub posts: Arc<dyn PostStore>,
    pub resources: Arc<dyn ResourceStore>,
    pub files: Arc<dyn FileStorage>,
}

impl Stores {
    /// Stores backed by the given Postgres pool, with uploads going to
    /// `files`.
    pub fn postgres(pool: PgPool, files: Arc<dyn FileStorage>) -> Self {
        Self {
            users: Arc::new(PgUserDirectory::new(pool.clone())),
            sessions: Arc::new(PgSessionStore::new(pool.clone())),
            posts: Arc::new(PgPostStore::new(pool.clone())),
            resources: Arc::new(PgResourceStore::new(pool)),
            files,
        }
    }

    /// Process-local stores, for tests and local experiments.
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(MemoryUserDirectory::new()),
            sessions: Arc::new(MemorySessionStore::new()),
            posts: Arc::new(MemoryPostStore::new()),
            resources: Arc::new(MemoryResourceStore::new()),
            files: Arc::new(MemoryFileStorage::new()),
        }
    }
}

/// Shared application state.
pub struct AppState {
    pub stores: Stores,
    /// Identity provider used for login.
    pub provider: Arc<dyn IdentityProvider>,
    /// The session-then-bearer gate.
    pub authenticator: Authenticator,
    /// Mints sessions and bearer credentials at login.
    pub issuer: CredentialIssuer,
    pub session_config: SessionConfig,
    /// Base URL of the browser client, without a trailing slash.
    pub client_url: String,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(
        stores: Stores,
        provider: Arc<dyn IdentityProvider>,
        codec: CredentialCodec,
        session_config: SessionConfig,
        client_url: &str,
    ) -> Self {
        let authenticator = Authenticator::new(
            stores.sessions.clone(),
            stores.users.clone(),
            codec.clone(),
        );
        let issuer = CredentialIssuer::new(
            stores.sessions.clone(),
            codec,
            Duration::minutes(session_config.duration_minutes),
        );
        Self {
            stores,
            provider,
            authenticator,
            issuer,
            session_config,
            client_url: client_url.trim_end_matches('/').to_string(),
        }
    }

    /// An absolute URL on the browser client.
    #[must_use]
    pub fn client_page(&self, path: &str) -> String {
        format!("{}{}", self.client_url, path)
    }
}
