//! Authentication extractor for Axum.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use chrono::Utc;
use std::sync::Arc;
use study_sync_platform_access::{AuthContext, AuthenticationError, PresentedProofs};

use super::AppState;
use crate::error::json_error;

/// Session cookie name.
pub const SESSION_COOKIE: &str = "session";

/// Extractor for requiring an authenticated caller.
///
/// Tries the `session` cookie, then `Authorization: Bearer`. A request
/// proving neither is answered with 401 before the handler runs.
pub struct RequireAuth(pub AuthContext);

impl<S> FromRequestParts<S> for RequireAuth
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = Arc::<AppState>::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);

        let authorization = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        let presented = PresentedProofs::from_parts(
            jar.get(SESSION_COOKIE).map(|c| c.value()),
            authorization,
        );

        let ctx = app_state
            .authenticator
            .authenticate(presented, Utc::now())
            .await
            .map_err(AuthRejection)?;

        Ok(RequireAuth(ctx))
    }
}

/// Rejection for [`RequireAuth`].
#[derive(Debug)]
pub struct AuthRejection(pub AuthenticationError);

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AuthenticationError::Store { details } => {
                tracing::error!(details = %details, "session lookup failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            other => {
                tracing::debug!(reason = %other, "request not authenticated");
                StatusCode::UNAUTHORIZED
            }
        };
        json_error(status, self.0.client_message())
    }
}
