//! Error types for the client crate.

use std::fmt;

/// Why a client operation failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// No usable identity: the stored credential expired or was rejected.
    /// The stored identity has already been evicted; show the login screen.
    NotAuthenticated,
    /// The request never produced a response.
    Transport { details: String },
    /// The server answered with an unexpected status.
    Status { status: u16, message: String },
    /// The response body was not the expected JSON.
    Decode { details: String },
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAuthenticated => write!(f, "not authenticated"),
            Self::Transport { details } => write!(f, "request failed: {details}"),
            Self::Status { status, message } => write!(f, "server answered {status}: {message}"),
            Self::Decode { details } => write!(f, "unexpected response body: {details}"),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode {
                details: err.to_string(),
            }
        } else {
            Self::Transport {
                details: err.to_string(),
            }
        }
    }
}
