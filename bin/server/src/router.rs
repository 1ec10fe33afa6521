//! Route table and cross-origin policy.

use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRef},
    http::{HeaderValue, Method, header},
    routing::{delete, get, patch, post},
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

use crate::api::{posts, resources, upload};
use crate::auth::{self, AppState};

/// Authentication and REST routes, for any state that can hand out
/// [`AppState`].
pub fn api_routes<S>() -> Router<S>
where
    Arc<AppState>: FromRef<S>,
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/auth/provider", get(auth::login))
        .route("/auth/provider/callback", get(auth::callback))
        .route("/auth/logout", get(auth::logout))
        .route("/auth/user", get(auth::current_user))
        .route("/api/posts", get(posts::list_posts).post(posts::create_post))
        .route("/api/posts/me", get(posts::my_posts))
        .route("/api/posts/{id}", delete(posts::delete_post))
        .route("/api/posts/{id}/like", patch(posts::toggle_like))
        .route("/api/posts/{id}/comments", post(posts::add_comment))
        .route(
            "/api/resources",
            get(resources::list_resources).post(resources::create_resource),
        )
        .route("/api/resources/me", get(resources::my_resources))
        .route("/api/resources/{id}", delete(resources::delete_resource))
        .route(
            "/api/upload",
            post(upload::upload_file).layer(DefaultBodyLimit::max(upload::MAX_UPLOAD_BYTES)),
        )
}

/// CORS for the given origins, with credentials.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(origin = %origin, error = %e, "ignoring unusable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}
