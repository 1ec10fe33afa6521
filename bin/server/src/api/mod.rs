//! The REST API over posts and resources.
//!
//! Listings are public. Everything that writes, and the per-user
//! listings, runs behind [`RequireAuth`](crate::auth::RequireAuth).

pub mod posts;
pub mod resources;
pub mod upload;

use axum::Json;
use axum_extra::extract::WithRejection;
use std::collections::HashSet;
use study_sync_content::{AuthorDirectory, AuthorSummary};
use study_sync_core::UserId;
use study_sync_platform_access::UserDirectory;

use crate::error::ApiError;

/// A JSON request body whose rejection is answered as an [`ApiError`].
pub(crate) type JsonBody<T> = WithRejection<Json<T>, ApiError>;

/// Profiles for every user in `ids`, for embedding in views.
///
/// Users that no longer resolve are left out and render as unknown.
pub(crate) async fn author_directory(
    users: &dyn UserDirectory,
    ids: impl IntoIterator<Item = UserId>,
) -> Result<AuthorDirectory, ApiError> {
    let mut seen = HashSet::new();
    let wanted: Vec<UserId> = ids.into_iter().filter(|id| seen.insert(*id)).collect();
    if wanted.is_empty() {
        return Ok(AuthorDirectory::new());
    }

    let found = users.find_by_ids(&wanted).await?;
    Ok(found
        .into_iter()
        .map(|user| {
            let summary = AuthorSummary::new(
                user.id(),
                user.display_name(),
                user.image().map(str::to_string),
            );
            (user.id(), summary)
        })
        .collect())
}

#[cfg(test)]
pub(crate) mod testing {
    //! Request helpers for the API handler tests.

    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
    };
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::auth::AppState;

    pub async fn send(
        state: Arc<AppState>,
        method: &str,
        uri: &str,
        authorization: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        match body {
            Some(json) => {
                send_body(
                    state,
                    method,
                    uri,
                    authorization,
                    Some("application/json"),
                    Body::from(json.to_string()),
                )
                .await
            }
            None => send_body(state, method, uri, authorization, None, Body::empty()).await,
        }
    }

    /// A `multipart/form-data` body with one file field. Returns the
    /// content type (with its boundary) and the body.
    pub fn multipart_file(field: &str, file_name: &str, bytes: &[u8]) -> (String, Body) {
        const BOUNDARY: &str = "study-sync-test-boundary";
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        (
            format!("multipart/form-data; boundary={BOUNDARY}"),
            Body::from(body),
        )
    }

    pub async fn send_body(
        state: Arc<AppState>,
        method: &str,
        uri: &str,
        authorization: Option<&str>,
        content_type: Option<&str>,
        body: Body,
    ) -> (StatusCode, serde_json::Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(value) = authorization {
            request = request.header("authorization", value);
        }
        if let Some(value) = content_type {
            request = request.header("content-type", value);
        }

        let app: Router = crate::router::api_routes().with_state(state);
        let response = app
            .oneshot(request.body(body).expect("request"))
            .await
            .expect("response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, json)
    }
}
