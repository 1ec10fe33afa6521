//! Error types for the platform-access crate.
//!
//! Storage and provider failures travel as rootcause reports
//! (`study_sync_core::Result<T, StoreError>`), so the HTTP layer can log the
//! full chain while answering with a generic message. Authentication
//! outcomes are plain values: every variant of [`AuthenticationError`] ends
//! in a response, never in a panic.

use std::fmt;

/// Why a request could not be attributed to a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationError {
    /// Neither a session nor a bearer credential was presented.
    NotLoggedIn,
    /// The bearer credential could not be decoded or its signature is wrong.
    InvalidToken,
    /// The bearer credential decoded but lacks a usable `id` or `timestamp`.
    InvalidTokenFormat,
    /// The bearer credential is older than the validity window.
    TokenExpired,
    /// The session store could not be consulted.
    Store { details: String },
}

impl AuthenticationError {
    /// The message returned to the client in the 401 body.
    #[must_use]
    pub fn client_message(&self) -> &'static str {
        match self {
            Self::NotLoggedIn => "Please log in to view this resource",
            Self::InvalidToken => "Invalid token",
            Self::InvalidTokenFormat => "Invalid token format",
            Self::TokenExpired => "Token expired, please log in again",
            Self::Store { .. } => "Server Error",
        }
    }
}

impl fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotLoggedIn => write!(f, "no session or bearer credential presented"),
            Self::InvalidToken => write!(f, "bearer credential could not be verified"),
            Self::InvalidTokenFormat => write!(f, "bearer credential is missing required claims"),
            Self::TokenExpired => write!(f, "bearer credential has expired"),
            Self::Store { details } => write!(f, "session lookup failed: {details}"),
        }
    }
}

impl std::error::Error for AuthenticationError {}

/// Why a bearer credential was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialError {
    /// Payload is not base64 JSON.
    Undecodable,
    /// Signature segment is missing (and unsigned credentials are refused)
    /// or does not match the payload.
    BadSignature,
    /// Payload lacks `id`/`timestamp`, or `id` is not a user identifier.
    MissingClaims,
    /// Issued at least one validity window ago.
    Expired,
}

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undecodable => write!(f, "credential is not decodable"),
            Self::BadSignature => write!(f, "credential signature is missing or invalid"),
            Self::MissingClaims => write!(f, "credential is missing required claims"),
            Self::Expired => write!(f, "credential has expired"),
        }
    }
}

impl std::error::Error for CredentialError {}

impl From<CredentialError> for AuthenticationError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::Undecodable | CredentialError::BadSignature => Self::InvalidToken,
            CredentialError::MissingClaims => Self::InvalidTokenFormat,
            CredentialError::Expired => Self::TokenExpired,
        }
    }
}

/// Failures of the user or session store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backing database rejected or failed the operation.
    Database { details: String },
    /// A stored row could not be turned back into a domain value.
    Corrupt { details: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Database { details } => write!(f, "database error: {details}"),
            Self::Corrupt { details } => write!(f, "corrupt stored record: {details}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Failures of the identity provider handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Provider settings are unusable (bad URLs and similar).
    Configuration { details: String },
    /// Provider metadata could not be discovered.
    Discovery { details: String },
    /// Exchanging the authorization code failed.
    Exchange { details: String },
    /// The returned ID token failed verification.
    Verification { details: String },
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration { details } => write!(f, "provider configuration error: {details}"),
            Self::Discovery { details } => write!(f, "provider discovery failed: {details}"),
            Self::Exchange { details } => write!(f, "authorization code exchange failed: {details}"),
            Self::Verification { details } => write!(f, "ID token verification failed: {details}"),
        }
    }
}

impl std::error::Error for ProviderError {}
