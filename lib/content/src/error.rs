//! Error types for the content crate.

use std::fmt;

/// Why a content operation was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentError {
    /// A post must have non-blank content.
    EmptyPost,
    /// A comment must have non-blank text.
    EmptyComment,
    /// A resource is missing one of its required fields.
    MissingResourceFields { missing: Vec<&'static str> },
    /// The caller does not own the record it tried to change.
    NotOwner,
}

impl ContentError {
    /// The message returned to the client.
    #[must_use]
    pub fn client_message(&self) -> &'static str {
        match self {
            Self::EmptyPost => "Post content is required.",
            Self::EmptyComment => "Comment text is required.",
            Self::MissingResourceFields { .. } => "Missing required fields for resource.",
            Self::NotOwner => "Not Authorized",
        }
    }
}

impl fmt::Display for ContentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPost => write!(f, "post content is empty"),
            Self::EmptyComment => write!(f, "comment text is empty"),
            Self::MissingResourceFields { missing } => {
                write!(f, "resource is missing fields: {}", missing.join(", "))
            }
            Self::NotOwner => write!(f, "caller does not own the record"),
        }
    }
}

impl std::error::Error for ContentError {}

/// Failures of the post or resource store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// The backing database rejected or failed the operation.
    Database { details: String },
    /// A stored row could not be turned back into a domain value.
    Corrupt { details: String },
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Database { details } => write!(f, "content database error: {details}"),
            Self::Corrupt { details } => write!(f, "corrupt content record: {details}"),
        }
    }
}

impl std::error::Error for RepositoryError {}

/// Failures of the file storage service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    /// The service could not be reached.
    Transport { details: String },
    /// The service answered with a failure status.
    Rejected { status: u16, details: String },
    /// The service answered with something other than an upload result.
    MalformedReply { details: String },
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport { details } => write!(f, "file storage unreachable: {details}"),
            Self::Rejected { status, details } => {
                write!(f, "file storage refused the upload ({status}): {details}")
            }
            Self::MalformedReply { details } => {
                write!(f, "unexpected file storage reply: {details}")
            }
        }
    }
}

impl std::error::Error for UploadError {}
