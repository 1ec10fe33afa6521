//! Identity, sessions and request authentication for study-sync.
//!
//! This crate provides:
//! - Local users keyed by their provider identity (`User`, `UserDirectory`)
//! - Server-side sessions (`Session`, `SessionId`, `SessionStore`)
//! - Signed bearer credentials (`CredentialCodec`)
//! - Issuance of both proofs at login (`CredentialIssuer`)
//! - The ordered session-then-bearer gate (`Authenticator`)
//! - The identity provider seam (`IdentityProvider`, `ProviderConfig`)
//!
//! # Example
//!
//! ```
//! use chrono::{Duration, Utc};
//! use std::sync::Arc;
//! use study_sync_platform_access::{
//!     Authenticator, CredentialCodec, CredentialIssuer, MemorySessionStore,
//!     MemoryUserDirectory, PresentedProofs, ProviderIdentity, UserDirectory,
//! };
//!
//! # tokio_test_block(async {
//! let sessions = Arc::new(MemorySessionStore::new());
//! let users = Arc::new(MemoryUserDirectory::new());
//! let codec = CredentialCodec::new("signing-secret");
//!
//! let user = users
//!     .resolve_or_create(&ProviderIdentity::new("g-123", "Ann"))
//!     .await
//!     .unwrap();
//! let issuer = CredentialIssuer::new(sessions.clone(), codec.clone(), Duration::days(7));
//! let issued = issuer.issue(&user).await.unwrap();
//!
//! let authenticator = Authenticator::new(sessions, users, codec);
//! let presented = PresentedProofs::from_parts(None, Some(&format!("Bearer {}", issued.bearer)));
//! let ctx = authenticator.authenticate(presented, Utc::now()).await.unwrap();
//! assert_eq!(ctx.user_id(), user.id());
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

pub mod auth;
pub mod authenticator;
pub mod credential;
pub mod error;
pub mod issuer;
pub mod memory;
pub mod provider;
pub mod session;
pub mod store;
pub mod user;

// Re-export main types at crate root
pub use auth::{AuthContext, AuthProof, PresentedProofs, ProofKind, UNKNOWN_EMAIL};
pub use authenticator::Authenticator;
pub use credential::{CredentialCodec, VerifiedCredential};
pub use error::{AuthenticationError, CredentialError, ProviderError, StoreError};
pub use issuer::{CredentialIssuer, IssuedCredentials};
pub use memory::{MemorySessionStore, MemoryUserDirectory};
pub use provider::{Handshake, IdentityProvider, ProviderConfig, ProviderIdentity, ProviderRedirect};
pub use session::{Session, SessionId};
pub use store::{SessionStore, UserDirectory};
pub use user::User;
