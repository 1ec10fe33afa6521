//! Post handlers: the feed, likes and comments.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use axum_extra::extract::WithRejection;
use std::str::FromStr;
use std::sync::Arc;
use study_sync_content::{Comment, NewComment, NewPost, Post, PostView};
use study_sync_core::PostId;
use tracing::info;

use super::{JsonBody, author_directory};
use crate::auth::{AppState, RequireAuth};
use crate::error::ApiError;

async fn render_all(state: &AppState, posts: &[Post]) -> Result<Vec<PostView>, ApiError> {
    let authors = author_directory(
        state.stores.users.as_ref(),
        posts.iter().flat_map(Post::referenced_users),
    )
    .await?;
    Ok(posts.iter().map(|p| PostView::render(p, &authors)).collect())
}

async fn render_one(state: &AppState, post: &Post) -> Result<PostView, ApiError> {
    let authors = author_directory(state.stores.users.as_ref(), post.referenced_users()).await?;
    Ok(PostView::render(post, &authors))
}

/// Ids that do not parse address nothing.
fn post_id(raw_id: &str) -> Result<PostId, ApiError> {
    PostId::from_str(raw_id).map_err(|_| ApiError::PostNotFound)
}

/// Loads the addressed post.
async fn load(state: &AppState, raw_id: &str) -> Result<Post, ApiError> {
    state
        .stores
        .posts
        .find(post_id(raw_id)?)
        .await?
        .ok_or(ApiError::PostNotFound)
}

/// `GET /api/posts`: every post, newest first.
pub async fn list_posts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<PostView>>, ApiError> {
    let posts = state.stores.posts.list_all().await?;
    Ok(Json(render_all(&state, &posts).await?))
}

/// `GET /api/posts/me`: the caller's posts, newest first.
pub async fn my_posts(
    State(state): State<Arc<AppState>>,
    RequireAuth(ctx): RequireAuth,
) -> Result<Json<Vec<PostView>>, ApiError> {
    let posts = state.stores.posts.list_by_author(ctx.user_id()).await?;
    Ok(Json(render_all(&state, &posts).await?))
}

/// `POST /api/posts`
pub async fn create_post(
    State(state): State<Arc<AppState>>,
    RequireAuth(ctx): RequireAuth,
    WithRejection(Json(body), _): JsonBody<NewPost>,
) -> Result<(StatusCode, Json<PostView>), ApiError> {
    let post = Post::new(ctx.user_id(), body.content)?;
    state.stores.posts.insert(&post).await?;
    info!(post_id = %post.id(), author = %ctx.user_id(), "post created");

    Ok((StatusCode::CREATED, Json(render_one(&state, &post).await?)))
}

/// `DELETE /api/posts/{id}`: authors only.
pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    RequireAuth(ctx): RequireAuth,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let post = load(&state, &id).await?;
    post.ensure_deletable_by(ctx.user_id())?;
    state.stores.posts.delete(post.id()).await?;
    info!(post_id = %post.id(), "post deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// `PATCH /api/posts/{id}/like`: likes, or takes the like back.
pub async fn toggle_like(
    State(state): State<Arc<AppState>>,
    RequireAuth(ctx): RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<PostView>, ApiError> {
    let post = state
        .stores
        .posts
        .toggle_like(post_id(&id)?, ctx.user_id())
        .await?
        .ok_or(ApiError::PostNotFound)?;

    Ok(Json(render_one(&state, &post).await?))
}

/// `POST /api/posts/{id}/comments`
pub async fn add_comment(
    State(state): State<Arc<AppState>>,
    RequireAuth(ctx): RequireAuth,
    Path(id): Path<String>,
    WithRejection(Json(body), _): JsonBody<NewComment>,
) -> Result<(StatusCode, Json<PostView>), ApiError> {
    let id = post_id(&id)?;
    let comment = Comment::new(ctx.user_id(), body.text)?;
    let post = state
        .stores
        .posts
        .add_comment(id, &comment)
        .await?
        .ok_or(ApiError::PostNotFound)?;

    Ok((StatusCode::CREATED, Json(render_one(&state, &post).await?)))
}
