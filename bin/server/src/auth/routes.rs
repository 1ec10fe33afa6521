//! Authentication routes for login, callback, logout and the current user.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use study_sync_core::{USER_QUERY_PARAM, UserId};
use study_sync_platform_access::{Handshake, SessionId, User};
use time::Duration as TimeDuration;
use tracing::{error, info, warn};
use url::Url;

use super::{AppState, SESSION_COOKIE};
use crate::error::{SERVER_ERROR, json_error};

/// Auth state cookie name (CSRF, PKCE and nonce during the provider flow).
const AUTH_STATE_COOKIE: &str = "auth_state";

/// Client page shown when the provider flow fails.
const LOGIN_FAILED_PAGE: &str = "/login-failed";

/// Client page the browser lands on after login.
const DASHBOARD_PAGE: &str = "/dashboard";

/// Query parameters of the provider callback.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// The profile returned by `GET /auth/user`.
///
/// `_id` duplicates `id` for clients written against the older document
/// shape.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub legacy_id: UserId,
    pub id: UserId,
    pub display_name: String,
    pub first_name: Option<String>,
    pub image: Option<String>,
    pub email: Option<String>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            legacy_id: user.id(),
            id: user.id(),
            display_name: user.display_name().to_string(),
            first_name: user.first_name().map(str::to_string),
            image: user.image().map(str::to_string),
            email: user.email().map(str::to_string),
        }
    }
}

fn removal(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, ""))
        .path("/")
        .max_age(TimeDuration::ZERO)
        .build()
}

/// Starts the provider flow.
pub async fn login(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let redirect = state.provider.begin();

    let handshake_json = match serde_json::to_string(&redirect.handshake) {
        Ok(json) => json,
        Err(e) => {
            error!(error = %e, "failed to serialize handshake");
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR);
        }
    };

    let cookie = Cookie::build((AUTH_STATE_COOKIE, handshake_json))
        .path("/")
        .http_only(true)
        .secure(state.session_config.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::minutes(10));

    (jar.add(cookie), Redirect::to(&redirect.url)).into_response()
}

/// Why a callback did not end in a signed-in browser.
#[derive(Debug)]
pub enum CallbackError {
    /// The provider refused, or the handshake could not be completed.
    Provider { details: String },
    /// The user or session could not be stored.
    Storage { details: String },
    /// The redirect target could not be built.
    Configuration { details: String },
}

impl fmt::Display for CallbackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Provider { details } => write!(f, "provider login failed: {details}"),
            Self::Storage { details } => write!(f, "login storage failure: {details}"),
            Self::Configuration { details } => write!(f, "login redirect failure: {details}"),
        }
    }
}

impl std::error::Error for CallbackError {}

fn provider_failure(details: impl Into<String>) -> CallbackError {
    CallbackError::Provider {
        details: details.into(),
    }
}

/// Finishes the provider flow.
///
/// Provider failures send the browser to the client's login-failed page.
/// Storage failures are answered with 500.
pub async fn callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallbackQuery>,
    jar: CookieJar,
) -> Response {
    let handshake = jar.get(AUTH_STATE_COOKIE).map(|c| c.value().to_string());
    let jar = jar.add(removal(AUTH_STATE_COOKIE));

    match finish_login(&state, query, handshake.as_deref()).await {
        Ok((session_cookie, target)) => {
            (jar.add(session_cookie), Redirect::to(&target)).into_response()
        }
        Err(e @ CallbackError::Provider { .. }) => {
            warn!(error = %e, "login failed");
            (jar, Redirect::to(&state.client_page(LOGIN_FAILED_PAGE))).into_response()
        }
        Err(e) => {
            error!(error = %e, "login could not be completed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR)
        }
    }
}

async fn finish_login(
    state: &AppState,
    query: CallbackQuery,
    handshake: Option<&str>,
) -> Result<(Cookie<'static>, String), CallbackError> {
    if let Some(reported) = query.error {
        return Err(provider_failure(format!("provider reported '{reported}'")));
    }
    let code = query
        .code
        .ok_or_else(|| provider_failure("callback without an authorization code"))?;

    let handshake: Handshake = handshake
        .ok_or_else(|| provider_failure("missing auth state cookie"))
        .and_then(|raw| {
            serde_json::from_str(raw)
                .map_err(|e| provider_failure(format!("invalid auth state cookie: {e}")))
        })?;

    if query.state.as_deref() != Some(handshake.csrf_token.as_str()) {
        return Err(provider_failure("CSRF token mismatch"));
    }

    let identity = state
        .provider
        .complete(&code, &handshake)
        .await
        .map_err(|e| provider_failure(e.to_string()))?;

    let user = state
        .stores
        .users
        .resolve_or_create(&identity)
        .await
        .map_err(|e| CallbackError::Storage {
            details: e.to_string(),
        })?;

    let issued = state
        .issuer
        .issue(&user)
        .await
        .map_err(|e| CallbackError::Storage {
            details: e.to_string(),
        })?;

    let mut target = Url::parse(&state.client_page(DASHBOARD_PAGE)).map_err(|e| {
        CallbackError::Configuration {
            details: format!("invalid client URL: {e}"),
        }
    })?;
    target
        .query_pairs_mut()
        .append_pair(USER_QUERY_PARAM, &issued.delivered_identity(&user).to_json());

    info!(user_id = %user.id(), "user logged in");

    Ok((session_cookie(state, issued.session.id()), target.into()))
}

fn session_cookie(state: &AppState, id: &SessionId) -> Cookie<'static> {
    let config = &state.session_config;
    let same_site = if config.cross_site {
        SameSite::None
    } else {
        SameSite::Lax
    };
    Cookie::build((SESSION_COOKIE, id.as_str().to_string()))
        .path("/")
        .http_only(true)
        .secure(config.secure_cookies)
        .same_site(same_site)
        .max_age(TimeDuration::minutes(config.duration_minutes))
        .build()
}

/// Logs out by deleting the session.
pub async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    if let Some(session_cookie) = jar.get(SESSION_COOKIE) {
        let session_id = SessionId::new(session_cookie.value().to_string());
        if let Err(e) = state.stores.sessions.destroy(&session_id).await {
            error!(error = %e, "failed to destroy session");
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR);
        }
    }

    (
        jar.add(removal(SESSION_COOKIE)),
        Redirect::to(&state.client_page("/")),
    )
        .into_response()
}

/// The user behind the session cookie. Bearer credentials are not
/// consulted.
pub async fn current_user(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return json_error(StatusCode::UNAUTHORIZED, "Not authorized");
    };

    let session_id = SessionId::new(cookie.value().to_string());
    match state
        .authenticator
        .session_user(&session_id, Utc::now())
        .await
    {
        Ok(Some(user)) => Json(UserProfile::from(&user)).into_response(),
        Ok(None) => json_error(StatusCode::UNAUTHORIZED, "Not authorized"),
        Err(e) => {
            error!(error = %e, "current user lookup failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR)
        }
    }
}
