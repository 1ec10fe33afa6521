//! HTTP access to the study-sync API.
//!
//! Every call passes through the [`RequestGateway`]: the bearer header is
//! attached (or the call refused) before sending, and a 401 evicts the
//! stored identity. In the browser the session cookie is sent along too.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use study_sync_content::{
    NewComment, NewPost, NewResource, PostView, ResourceView, StoredFile,
};
use study_sync_core::{DeliveredIdentity, PostId, ResourceId};
use tracing::debug;
use url::Url;

use crate::error::ClientError;
use crate::gateway::RequestGateway;
use crate::reconcile::SessionProbe;
use crate::store::ClientIdentityStore;

#[derive(serde::Deserialize)]
struct ErrorBody {
    message: String,
}

#[cfg(target_arch = "wasm32")]
fn include_cookies(request: RequestBuilder) -> RequestBuilder {
    request.fetch_credentials_include()
}

// Native clients have no cookie store configured; only the bearer header
// identifies them.
#[cfg(not(target_arch = "wasm32"))]
fn include_cookies(request: RequestBuilder) -> RequestBuilder {
    request
}

async fn failure(response: reqwest::Response) -> ClientError {
    let status = response.status().as_u16();
    let message = response
        .json::<ErrorBody>()
        .await
        .map(|b| b.message)
        .unwrap_or_default();
    ClientError::Status { status, message }
}

/// Typed client for the REST API.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    gateway: RequestGateway,
}

impl ApiClient {
    /// Creates a client for the API at `base_url`, reading the identity
    /// from `store`.
    ///
    /// # Errors
    ///
    /// Fails if `base_url` is not an absolute URL.
    pub fn new(base_url: &str, store: Arc<dyn ClientIdentityStore>) -> Result<Self, ClientError> {
        let base = Url::parse(base_url).map_err(|e| ClientError::Transport {
            details: format!("invalid API base URL '{base_url}': {e}"),
        })?;
        Ok(Self {
            http: reqwest::Client::new(),
            base,
            gateway: RequestGateway::new(store),
        })
    }

    #[must_use]
    pub fn gateway(&self) -> &RequestGateway {
        &self.gateway
    }

    /// A probe of `/auth/user` sharing this client's connection settings.
    #[must_use]
    pub fn session_probe(&self) -> HttpSessionProbe {
        HttpSessionProbe {
            http: self.http.clone(),
            base: self.base.clone(),
        }
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        self.base.join(path).map_err(|e| ClientError::Transport {
            details: format!("invalid API path '{path}': {e}"),
        })
    }

    /// A request to `path` carrying the credentials the gateway allows.
    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let authorization = self.gateway.authorize(Utc::now())?;

        let mut request = include_cookies(self.http.request(method, self.url(path)?));
        if let Some(value) = authorization {
            request = request.header(reqwest::header::AUTHORIZATION, value);
        }
        Ok(request)
    }

    async fn dispatch(
        &self,
        request: RequestBuilder,
        path: &str,
    ) -> Result<reqwest::Response, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        debug!(%status, path, "api response");

        if self.gateway.observe(status.as_u16()) {
            return Err(ClientError::NotAuthenticated);
        }
        if !status.is_success() {
            return Err(failure(response).await);
        }
        Ok(response)
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<reqwest::Response, ClientError> {
        let mut request = self.request(method, path)?;
        if let Some(body) = body {
            request = request.json(body);
        }
        self.dispatch(request, path).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.send::<()>(Method::GET, path, None).await?;
        Ok(response.json().await?)
    }

    pub async fn list_posts(&self) -> Result<Vec<PostView>, ClientError> {
        self.get_json("/api/posts").await
    }

    pub async fn my_posts(&self) -> Result<Vec<PostView>, ClientError> {
        self.get_json("/api/posts/me").await
    }

    pub async fn create_post(&self, content: &str) -> Result<PostView, ClientError> {
        let body = NewPost {
            content: content.to_string(),
        };
        let response = self.send(Method::POST, "/api/posts", Some(&body)).await?;
        Ok(response.json().await?)
    }

    pub async fn delete_post(&self, id: PostId) -> Result<(), ClientError> {
        self.send::<()>(Method::DELETE, &format!("/api/posts/{id}"), None)
            .await?;
        Ok(())
    }

    /// Likes the post, or takes an existing like back.
    pub async fn toggle_like(&self, id: PostId) -> Result<PostView, ClientError> {
        let response = self
            .send::<()>(Method::PATCH, &format!("/api/posts/{id}/like"), None)
            .await?;
        Ok(response.json().await?)
    }

    pub async fn add_comment(&self, id: PostId, text: &str) -> Result<PostView, ClientError> {
        let body = NewComment {
            text: text.to_string(),
        };
        let response = self
            .send(Method::POST, &format!("/api/posts/{id}/comments"), Some(&body))
            .await?;
        Ok(response.json().await?)
    }

    pub async fn list_resources(&self) -> Result<Vec<ResourceView>, ClientError> {
        self.get_json("/api/resources").await
    }

    pub async fn my_resources(&self) -> Result<Vec<ResourceView>, ClientError> {
        self.get_json("/api/resources/me").await
    }

    pub async fn create_resource(&self, fields: &NewResource) -> Result<ResourceView, ClientError> {
        let response = self
            .send(Method::POST, "/api/resources", Some(fields))
            .await?;
        Ok(response.json().await?)
    }

    pub async fn delete_resource(&self, id: ResourceId) -> Result<(), ClientError> {
        self.send::<()>(Method::DELETE, &format!("/api/resources/{id}"), None)
            .await?;
        Ok(())
    }

    /// Sends a file to the storage service through the API. The returned
    /// URL and id go into [`ApiClient::create_resource`].
    pub async fn upload_file(&self, name: &str, bytes: Vec<u8>) -> Result<StoredFile, ClientError> {
        let form = Form::new().part("file", Part::bytes(bytes).file_name(name.to_string()));
        let request = self.request(Method::POST, "/api/upload")?.multipart(form);
        let response = self.dispatch(request, "/api/upload").await?;
        Ok(response.json().await?)
    }
}

/// [`SessionProbe`] over `GET /auth/user`, cookies only.
#[derive(Clone)]
pub struct HttpSessionProbe {
    http: reqwest::Client,
    base: Url,
}

#[async_trait(?Send)]
impl SessionProbe for HttpSessionProbe {
    async fn probe(&self) -> Result<Option<DeliveredIdentity>, ClientError> {
        let url = self
            .base
            .join("/auth/user")
            .map_err(|e| ClientError::Transport {
                details: e.to_string(),
            })?;
        let response = include_cookies(self.http.get(url)).send().await?;

        match response.status() {
            StatusCode::UNAUTHORIZED => Ok(None),
            status if status.is_success() => {
                let text = response.text().await?;
                DeliveredIdentity::from_json(&text)
                    .map(Some)
                    .map_err(|e| ClientError::Decode {
                        details: e.to_string(),
                    })
            }
            _ => Err(failure(response).await),
        }
    }
}
