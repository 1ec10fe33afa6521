//! OIDC identity provider using the openidconnect crate.

use async_trait::async_trait;
use openidconnect::core::{CoreAuthenticationFlow, CoreClient, CoreProviderMetadata};
use openidconnect::{
    AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointMaybeSet, EndpointNotSet,
    EndpointSet, IssuerUrl, Nonce, PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, Scope,
    TokenResponse,
};
use study_sync_core::Result;
use study_sync_platform_access::{
    Handshake, IdentityProvider, ProviderConfig, ProviderError, ProviderIdentity,
    ProviderRedirect,
};
use tracing::{debug, instrument};

type DiscoveredClient = CoreClient<
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointMaybeSet,
    EndpointMaybeSet,
>;

fn http_client() -> std::result::Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
}

/// An OIDC provider discovered from its issuer URL.
pub struct OidcProvider {
    client: DiscoveredClient,
    http_client: reqwest::Client,
    scopes: Vec<String>,
}

impl OidcProvider {
    /// Discovers the provider metadata and builds the client.
    ///
    /// # Errors
    ///
    /// Fails on unusable URLs or when discovery does not succeed.
    pub async fn discover(config: ProviderConfig) -> Result<Self, ProviderError> {
        let issuer_url = IssuerUrl::new(config.issuer_url().to_string()).map_err(|e| {
            ProviderError::Configuration {
                details: format!("invalid issuer URL: {e}"),
            }
        })?;

        let http_client = http_client().map_err(|e| ProviderError::Configuration {
            details: format!("failed to create HTTP client: {e}"),
        })?;

        let provider_metadata = CoreProviderMetadata::discover_async(issuer_url, &http_client)
            .await
            .map_err(|e| ProviderError::Discovery {
                details: e.to_string(),
            })?;

        let redirect_url = RedirectUrl::new(config.redirect_uri().to_string()).map_err(|e| {
            ProviderError::Configuration {
                details: format!("invalid redirect URI: {e}"),
            }
        })?;

        let client = CoreClient::from_provider_metadata(
            provider_metadata,
            ClientId::new(config.client_id().to_string()),
            Some(ClientSecret::new(config.client_secret().to_string())),
        )
        .set_redirect_uri(redirect_url);

        Ok(Self {
            client,
            http_client,
            scopes: config.scopes().into_iter().map(str::to_string).collect(),
        })
    }
}

#[async_trait]
impl IdentityProvider for OidcProvider {
    fn begin(&self) -> ProviderRedirect {
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let mut auth_request = self
            .client
            .authorize_url(
                CoreAuthenticationFlow::AuthorizationCode,
                CsrfToken::new_random,
                Nonce::new_random,
            )
            .set_pkce_challenge(pkce_challenge);

        for scope in &self.scopes {
            auth_request = auth_request.add_scope(Scope::new(scope.clone()));
        }

        let (auth_url, csrf_token, nonce) = auth_request.url();

        ProviderRedirect {
            url: auth_url.to_string(),
            handshake: Handshake {
                csrf_token: csrf_token.secret().clone(),
                pkce_verifier: pkce_verifier.secret().clone(),
                nonce: nonce.secret().clone(),
            },
        }
    }

    #[instrument(skip_all)]
    async fn complete(
        &self,
        code: &str,
        handshake: &Handshake,
    ) -> Result<ProviderIdentity, ProviderError> {
        let token_response = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .map_err(|e| ProviderError::Exchange {
                details: format!("token endpoint error: {e}"),
            })?
            .set_pkce_verifier(PkceCodeVerifier::new(handshake.pkce_verifier.clone()))
            .request_async(&self.http_client)
            .await
            .map_err(|e| ProviderError::Exchange {
                details: e.to_string(),
            })?;

        let id_token = token_response
            .id_token()
            .ok_or_else(|| ProviderError::Verification {
                details: "no ID token in response".to_string(),
            })?;

        let nonce = Nonce::new(handshake.nonce.clone());
        let claims = id_token
            .claims(&self.client.id_token_verifier(), &nonce)
            .map_err(|e| ProviderError::Verification {
                details: e.to_string(),
            })?;

        let subject = claims.subject().to_string();
        let email: Option<String> = claims.email().map(|e| e.as_str().to_string());
        let display_name = claims
            .name()
            .and_then(|n| n.get(None))
            .map(|n| n.as_str().to_string())
            .or_else(|| claims.preferred_username().map(|u| u.as_str().to_string()))
            .or_else(|| email.clone())
            .unwrap_or_else(|| subject.clone());
        let first_name = claims
            .given_name()
            .and_then(|n| n.get(None))
            .map(|n| n.as_str().to_string());
        let image = claims
            .picture()
            .and_then(|p| p.get(None))
            .map(|p| p.as_str().to_string());

        debug!(subject = %subject, "provider identity verified");

        Ok(ProviderIdentity::new(subject, display_name)
            .with_first_name(first_name)
            .with_image(image)
            .with_email(email))
    }
}
