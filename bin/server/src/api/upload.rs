//! File upload: forwards one file to the storage service.

use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
};
use axum_extra::extract::WithRejection;
use serde::Serialize;
use std::sync::Arc;
use study_sync_content::StoredFile;
use tracing::info;

use crate::auth::{AppState, RequireAuth};
use crate::error::ApiError;

/// Name of the form field carrying the file.
pub const FILE_FIELD: &str = "file";

/// Largest accepted upload body.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Body of a successful upload. `cloudinaryId` repeats `storageId` for
/// older clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: &'static str,
    #[serde(flatten)]
    pub file: StoredFile,
    pub cloudinary_id: String,
}

/// `POST /api/upload`: a `multipart/form-data` body with a `file` field.
///
/// Answers with the URL and storage id to pass to `POST /api/resources`.
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    RequireAuth(ctx): RequireAuth,
    WithRejection(mut multipart, _): WithRejection<Multipart, ApiError>,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;
        // Browsers send an empty, unnamed part when no file was picked.
        if !(name.is_empty() && bytes.is_empty()) {
            upload = Some((name, bytes));
        }
        break;
    }
    let (name, bytes) = upload.ok_or(ApiError::NoFile)?;

    let stored = state.stores.files.upload(&name, bytes.to_vec()).await?;
    info!(
        storage_id = %stored.storage_id,
        size = bytes.len(),
        uploader = %ctx.user_id(),
        "file uploaded"
    );

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            message: "File uploaded successfully!",
            cloudinary_id: stored.storage_id.clone(),
            file: stored,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use crate::api::testing::{multipart_file, send, send_body};
    use crate::auth::testing::{self, signed_in};
    use axum::{body::Body, http::StatusCode};

    #[tokio::test]
    async fn uploaded_file_is_stored_and_described() {
        let state = testing::state();
        let (_, ann) = signed_in(&state, "g-1", "Ann").await;
        let (content_type, body) = multipart_file("file", "week1.pdf", b"%PDF-1.7");

        let (status, json) =
            send_body(state, "POST", "/api/upload", Some(&ann), Some(&content_type), body).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["message"], "File uploaded successfully!");
        let storage_id = json["storageId"].as_str().expect("storage id");
        assert_eq!(json["cloudinaryId"], storage_id);
        assert_eq!(json["url"], format!("memory://{storage_id}"));
        assert!(storage_id.ends_with("week1.pdf"));
    }

    #[tokio::test]
    async fn upload_result_can_be_shared_as_a_resource() {
        let state = testing::state();
        let (_, ann) = signed_in(&state, "g-1", "Ann").await;
        let (content_type, body) = multipart_file("file", "notes.txt", b"graphs");
        let (_, uploaded) = send_body(
            state.clone(),
            "POST",
            "/api/upload",
            Some(&ann),
            Some(&content_type),
            body,
        )
        .await;

        let (status, created) = send(
            state,
            "POST",
            "/api/resources",
            Some(&ann),
            Some(serde_json::json!({
                "title": "Notes",
                "description": "Week 1",
                "url": uploaded["url"],
                "cloudinaryId": uploaded["cloudinaryId"],
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["storageId"], uploaded["storageId"]);
    }

    #[tokio::test]
    async fn a_form_without_the_file_field_is_refused() {
        let state = testing::state();
        let (_, ann) = signed_in(&state, "g-1", "Ann").await;
        let (content_type, body) = multipart_file("attachment", "notes.txt", b"graphs");

        let (status, json) =
            send_body(state, "POST", "/api/upload", Some(&ann), Some(&content_type), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "No file uploaded.");
    }

    #[tokio::test]
    async fn an_empty_file_input_is_refused() {
        let state = testing::state();
        let (_, ann) = signed_in(&state, "g-1", "Ann").await;
        let (content_type, body) = multipart_file("file", "", b"");

        let (status, json) =
            send_body(state, "POST", "/api/upload", Some(&ann), Some(&content_type), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "No file uploaded.");
    }

    #[tokio::test]
    async fn a_non_multipart_body_is_a_bad_request() {
        let state = testing::state();
        let (_, ann) = signed_in(&state, "g-1", "Ann").await;

        let (status, json) = send_body(
            state,
            "POST",
            "/api/upload",
            Some(&ann),
            Some("application/json"),
            Body::from("{}"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Invalid request body.");
    }

    #[tokio::test]
    async fn uploading_requires_authentication() {
        let (content_type, body) = multipart_file("file", "notes.txt", b"graphs");

        let (status, json) = send_body(
            testing::state(),
            "POST",
            "/api/upload",
            None,
            Some(&content_type),
            body,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["message"], "Please log in to view this resource");
    }
}
