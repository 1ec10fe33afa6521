//! Identity provider seam.
//!
//! The server talks to its OAuth/OIDC provider only through
//! [`IdentityProvider`]: `begin` produces the redirect into the provider and
//! the handshake secrets to remember, `complete` trades the callback's
//! authorization code for a verified [`ProviderIdentity`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use study_sync_core::Result;

use crate::error::ProviderError;

/// Connection settings for the identity provider.
///
/// Loaded from `PROVIDER__*` environment variables by the server.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Issuer URL used for OIDC discovery.
    issuer_url: String,
    client_id: String,
    client_secret: String,
    /// Where the provider sends the browser back to
    /// (`https://api.example.com/auth/provider/callback`).
    redirect_uri: String,
    /// Comma-separated scopes. Default: `openid,email,profile`.
    #[serde(default = "default_scopes")]
    scopes: String,
}

fn default_scopes() -> String {
    "openid,email,profile".to_string()
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("issuer_url", &self.issuer_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .finish()
    }
}

impl ProviderConfig {
    #[must_use]
    pub fn new(
        issuer_url: String,
        client_id: String,
        client_secret: String,
        redirect_uri: String,
    ) -> Self {
        Self {
            issuer_url,
            client_id,
            client_secret,
            redirect_uri,
            scopes: default_scopes(),
        }
    }

    /// Replaces the requested scopes.
    #[must_use]
    pub fn with_scopes(mut self, scopes: &[&str]) -> Self {
        self.scopes = scopes.join(",");
        self
    }

    #[must_use]
    pub fn issuer_url(&self) -> &str {
        &self.issuer_url
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    #[must_use]
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Scopes to request, blanks dropped.
    #[must_use]
    pub fn scopes(&self) -> Vec<&str> {
        self.scopes
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// What the provider vouches for after a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderIdentity {
    /// Stable subject identifier issued by the provider.
    pub external_id: String,
    pub display_name: String,
    pub first_name: Option<String>,
    /// Avatar URL.
    pub image: Option<String>,
    pub email: Option<String>,
}

impl ProviderIdentity {
    #[must_use]
    pub fn new(external_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            external_id: external_id.into(),
            display_name: display_name.into(),
            first_name: None,
            image: None,
            email: None,
        }
    }

    #[must_use]
    pub fn with_first_name(mut self, first_name: Option<String>) -> Self {
        self.first_name = first_name;
        self
    }

    #[must_use]
    pub fn with_image(mut self, image: Option<String>) -> Self {
        self.image = image;
        self
    }

    #[must_use]
    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.email = email;
        self
    }
}

/// Secrets generated when the handshake starts and checked when it ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handshake {
    /// CSRF token echoed back by the provider as `state`.
    pub csrf_token: String,
    pub pkce_verifier: String,
    pub nonce: String,
}

/// Where to send the browser to start a login, and what to remember.
#[derive(Debug, Clone)]
pub struct ProviderRedirect {
    pub url: String,
    pub handshake: Handshake,
}

/// A third-party login provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Starts a handshake.
    fn begin(&self) -> ProviderRedirect;

    /// Completes a handshake with the authorization code from the callback.
    async fn complete(
        &self,
        code: &str,
        handshake: &Handshake,
    ) -> Result<ProviderIdentity, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_scopes() {
        let json = r#"{
            "issuer_url": "https://accounts.example.com",
            "client_id": "study-sync",
            "client_secret": "secret",
            "redirect_uri": "http://localhost:5000/auth/provider/callback"
        }"#;
        let config: ProviderConfig = serde_json::from_str(json).expect("deserialize");

        assert_eq!(config.issuer_url(), "https://accounts.example.com");
        assert_eq!(config.scopes(), vec!["openid", "email", "profile"]);
    }

    #[test]
    fn scopes_are_trimmed_and_blanks_dropped() {
        let config = ProviderConfig::new(
            "https://accounts.example.com".into(),
            "id".into(),
            "secret".into(),
            "http://localhost/cb".into(),
        )
        .with_scopes(&["openid", " profile ", ""]);

        assert_eq!(config.scopes(), vec!["openid", "profile"]);
    }

    #[test]
    fn handshake_survives_cookie_serialization() {
        let handshake = Handshake {
            csrf_token: "csrf".into(),
            pkce_verifier: "verifier".into(),
            nonce: "nonce".into(),
        };
        let json = serde_json::to_string(&handshake).expect("serialize");
        let back: Handshake = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, handshake);
    }
}
