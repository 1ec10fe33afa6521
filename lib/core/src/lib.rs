//! Core types shared by every study-sync crate.
//!
//! - Prefixed ULID identifiers for users, posts, comments and resources
//! - The bearer credential wire format and its validity window
//! - The identity payload delivered to the browser after login
//!
//! This crate compiles for both the server and the wasm client.

pub mod credential;
pub mod error;
pub mod id;
pub mod identity;

pub use credential::{CredentialClaims, VALIDITY_WINDOW_MS, WireError};
pub use error::Result;
pub use id::{CommentId, ParseIdError, PostId, ResourceId, UserId};
pub use identity::{DeliveredIdentity, USER_QUERY_PARAM};
