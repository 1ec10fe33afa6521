//! Resource handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use axum_extra::extract::WithRejection;
use std::str::FromStr;
use std::sync::Arc;
use study_sync_content::{ContentError, NewResource, Resource, ResourceView};
use study_sync_core::ResourceId;
use tracing::{debug, info};

use super::{JsonBody, author_directory};
use crate::auth::{AppState, RequireAuth};
use crate::error::ApiError;

async fn render_all(
    state: &AppState,
    resources: &[Resource],
) -> Result<Vec<ResourceView>, ApiError> {
    let authors = author_directory(
        state.stores.users.as_ref(),
        resources.iter().map(Resource::author),
    )
    .await?;
    Ok(resources
        .iter()
        .map(|r| ResourceView::render(r, &authors))
        .collect())
}

/// `GET /api/resources`: every resource, newest first.
pub async fn list_resources(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ResourceView>>, ApiError> {
    let resources = state.stores.resources.list_all().await?;
    Ok(Json(render_all(&state, &resources).await?))
}

/// `GET /api/resources/me`
pub async fn my_resources(
    State(state): State<Arc<AppState>>,
    RequireAuth(ctx): RequireAuth,
) -> Result<Json<Vec<ResourceView>>, ApiError> {
    let resources = state
        .stores
        .resources
        .list_by_author(ctx.user_id())
        .await?;
    Ok(Json(render_all(&state, &resources).await?))
}

/// `POST /api/resources`
pub async fn create_resource(
    State(state): State<Arc<AppState>>,
    RequireAuth(ctx): RequireAuth,
    WithRejection(Json(body), _): JsonBody<NewResource>,
) -> Result<(StatusCode, Json<ResourceView>), ApiError> {
    let resource = Resource::new(ctx.user_id(), body)?;
    state.stores.resources.insert(&resource).await?;
    info!(resource_id = %resource.id(), author = %ctx.user_id(), "resource shared");

    let view = render_all(&state, std::slice::from_ref(&resource))
        .await?
        .pop()
        .ok_or(ApiError::ResourceNotFound)?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// `DELETE /api/resources/{id}`
///
/// A missing resource is refused like someone else's, so callers cannot
/// learn which ids exist.
pub async fn delete_resource(
    State(state): State<Arc<AppState>>,
    RequireAuth(ctx): RequireAuth,
    Path(raw_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let not_authorized = ApiError::Content(ContentError::NotOwner);

    let Ok(id) = ResourceId::from_str(&raw_id) else {
        debug!(id = %raw_id, "resource id does not parse");
        return Err(not_authorized);
    };
    let Some(resource) = state.stores.resources.find(id).await? else {
        debug!(resource_id = %id, "resource not found");
        return Err(not_authorized);
    };

    resource.ensure_deletable_by(ctx.user_id())?;
    state.stores.resources.delete(id).await?;
    info!(resource_id = %id, "resource deleted");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::api::testing::{send, send_body};
    use crate::auth::testing::{self, signed_in};
    use axum::{body::Body, http::StatusCode};
    use serde_json::json;

    fn upload(title: &str) -> serde_json::Value {
        json!({
            "title": title,
            "description": "notes",
            "url": "https://files.example.com/notes.pdf",
            "cloudinaryId": "abc123"
        })
    }

    #[tokio::test]
    async fn shared_resources_are_listed_publicly() {
        let state = testing::state();
        let (_, ann) = signed_in(&state, "g-1", "Ann").await;

        let (status, created) =
            send(state.clone(), "POST", "/api/resources", Some(&ann), Some(upload("Week 1"))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["storageId"], "abc123");
        assert_eq!(created["author"]["displayName"], "Ann");

        let (status, body) = send(state, "GET", "/api/resources", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["title"], "Week 1");
    }

    #[tokio::test]
    async fn incomplete_uploads_are_refused() {
        let state = testing::state();
        let (_, ann) = signed_in(&state, "g-1", "Ann").await;

        let (status, body) = send(
            state,
            "POST",
            "/api/resources",
            Some(&ann),
            Some(json!({"title": "only a title"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Missing required fields for resource.");
    }

    #[tokio::test]
    async fn malformed_json_is_answered_with_a_json_message() {
        let state = testing::state();
        let (_, ann) = signed_in(&state, "g-1", "Ann").await;

        let (status, body) = send_body(
            state,
            "POST",
            "/api/resources",
            Some(&ann),
            Some("application/json"),
            Body::from("[1, 2"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid request body.");
    }

    #[tokio::test]
    async fn my_resources_only_lists_the_callers() {
        let state = testing::state();
        let (_, ann) = signed_in(&state, "g-1", "Ann").await;
        let (_, bob) = signed_in(&state, "g-2", "Bob").await;
        send(state.clone(), "POST", "/api/resources", Some(&ann), Some(upload("A"))).await;
        send(state.clone(), "POST", "/api/resources", Some(&bob), Some(upload("B"))).await;

        let (_, body) = send(state, "GET", "/api/resources/me", Some(&ann), None).await;
        assert_eq!(body.as_array().map(Vec::len), Some(1));
        assert_eq!(body[0]["title"], "A");
    }

    #[tokio::test]
    async fn deleting_someone_elses_or_a_missing_resource_is_unauthorized() {
        let state = testing::state();
        let (_, ann) = signed_in(&state, "g-1", "Ann").await;
        let (_, bob) = signed_in(&state, "g-2", "Bob").await;
        let (_, created) =
            send(state.clone(), "POST", "/api/resources", Some(&ann), Some(upload("A"))).await;
        let uri = format!("/api/resources/{}", created["id"].as_str().expect("id"));

        let (status, body) = send(state.clone(), "DELETE", &uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Not Authorized");

        let (status, _) = send(state.clone(), "DELETE", &uri, Some(&ann), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = send(state, "DELETE", &uri, Some(&ann), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Not Authorized");
    }
}
