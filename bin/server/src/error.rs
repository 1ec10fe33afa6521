//! HTTP-facing error types for the REST API.
//!
//! Every failure ends in a JSON body `{ "message": ... }`. Storage details
//! are logged and never sent to the client.

use axum::{
    Json,
    extract::multipart::{MultipartError, MultipartRejection},
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rootcause::Report;
use serde::Serialize;
use std::fmt;
use study_sync_content::{ContentError, RepositoryError, UploadError};
use study_sync_platform_access::StoreError;

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

/// A JSON error response with the given status.
pub fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            message: message.into(),
        }),
    )
        .into_response()
}

/// Message sent for any storage failure.
pub const SERVER_ERROR: &str = "Server Error";

/// Content API errors.
#[derive(Debug)]
pub enum ApiError {
    /// A content rule was broken (empty text, missing fields, not owner).
    Content(ContentError),
    /// The addressed post does not exist.
    PostNotFound,
    /// The addressed resource does not exist.
    ResourceNotFound,
    /// The request body could not be read as the expected JSON or form.
    MalformedBody { details: String },
    /// An upload request carried no file.
    NoFile,
    /// A store failed.
    Storage { details: String },
    /// The file storage service failed.
    Upload { details: String },
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Content(e) => write!(f, "{e}"),
            Self::PostNotFound => write!(f, "post not found"),
            Self::ResourceNotFound => write!(f, "resource not found"),
            Self::MalformedBody { details } => write!(f, "malformed request body: {details}"),
            Self::NoFile => write!(f, "no file in upload"),
            Self::Storage { details } => write!(f, "storage failure: {details}"),
            Self::Upload { details } => write!(f, "upload failure: {details}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<ContentError> for ApiError {
    fn from(err: ContentError) -> Self {
        Self::Content(err)
    }
}

impl From<Report<RepositoryError>> for ApiError {
    fn from(report: Report<RepositoryError>) -> Self {
        Self::Storage {
            details: format!("{report}"),
        }
    }
}

impl From<Report<StoreError>> for ApiError {
    fn from(report: Report<StoreError>) -> Self {
        Self::Storage {
            details: format!("{report}"),
        }
    }
}

impl From<Report<UploadError>> for ApiError {
    fn from(report: Report<UploadError>) -> Self {
        Self::Upload {
            details: format!("{report}"),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::MalformedBody {
            details: rejection.body_text(),
        }
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::MalformedBody {
            details: rejection.body_text(),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::MalformedBody {
            details: err.body_text(),
        }
    }
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Content(ContentError::NotOwner) => StatusCode::UNAUTHORIZED,
            Self::Content(_) => StatusCode::BAD_REQUEST,
            Self::PostNotFound | Self::ResourceNotFound => StatusCode::NOT_FOUND,
            Self::MalformedBody { .. } | Self::NoFile => StatusCode::BAD_REQUEST,
            Self::Storage { .. } | Self::Upload { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn client_message(&self) -> &'static str {
        match self {
            Self::Content(e) => e.client_message(),
            Self::PostNotFound => "Post not found",
            Self::ResourceNotFound => "Resource not found",
            Self::MalformedBody { .. } => "Invalid request body.",
            Self::NoFile => "No file uploaded.",
            Self::Storage { .. } => SERVER_ERROR,
            Self::Upload { .. } => "File upload failed.",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Storage { details } => tracing::error!(details = %details, "storage failure"),
            Self::Upload { details } => tracing::error!(details = %details, "upload failure"),
            other => tracing::debug!(error = %other, "request refused"),
        }
        json_error(self.status(), self.client_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ownership_violations_are_unauthorized() {
        assert_eq!(
            ApiError::Content(ContentError::NotOwner).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Content(ContentError::EmptyPost).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn upload_failures_hide_the_service_reply() {
        let report: Report<UploadError> = UploadError::Rejected {
            status: 401,
            details: "api_secret mismatch".into(),
        }
        .into();
        let err = ApiError::from(report);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.client_message(), "File upload failed.");
        assert!(err.to_string().contains("api_secret mismatch"));
    }

    #[test]
    fn storage_details_stay_on_the_server() {
        let report: Report<RepositoryError> = RepositoryError::Database {
            details: "connection refused".into(),
        }
        .into();
        let err = ApiError::from(report);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.client_message(), SERVER_ERROR);
        assert!(err.to_string().contains("connection refused"));
    }
}
