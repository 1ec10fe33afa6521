//! Centralized server configuration.
//!
//! Loaded via the `config` crate from environment variables, with `__`
//! separating nested keys (`SESSION__DURATION_MINUTES`,
//! `PROVIDER__CLIENT_ID`, `CREDENTIAL__SECRET`, `STORAGE__CLOUD_NAME`).

use serde::Deserialize;
use study_sync_platform_access::{CredentialCodec, ProviderConfig};

/// Server configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// PostgreSQL database connection URL.
    pub database_url: String,

    /// Where the browser client lives. Post-login redirects go here.
    #[serde(default = "default_client_url")]
    pub client_url: String,

    /// Extra origins allowed to call the API with credentials, comma
    /// separated. The client URL is always allowed.
    #[serde(default)]
    pub cors_origins: Option<String>,

    #[serde(default)]
    pub session: SessionConfig,

    /// Identity provider settings.
    pub provider: ProviderConfig,

    pub credential: CredentialConfig,

    /// File storage service settings.
    pub storage: StorageConfig,
}

fn default_client_url() -> String {
    "http://localhost:3000".to_string()
}

/// Session-related configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Session duration in minutes.
    #[serde(default = "default_session_duration_minutes")]
    pub duration_minutes: i64,

    /// Interval between session cleanup runs, in seconds.
    #[serde(default = "default_cleanup_interval_seconds")]
    pub cleanup_interval_seconds: u64,

    /// Whether to set the Secure flag on cookies (requires HTTPS).
    /// Defaults to true; set to false for local HTTP development.
    #[serde(default = "default_secure_cookies")]
    pub secure_cookies: bool,

    /// Send the session cookie with `SameSite=None` so a client on another
    /// site can use it. Requires `secure_cookies`.
    #[serde(default)]
    pub cross_site: bool,
}

fn default_session_duration_minutes() -> i64 {
    7 * 24 * 60
}

fn default_cleanup_interval_seconds() -> u64 {
    300
}

fn default_secure_cookies() -> bool {
    true
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration_minutes: default_session_duration_minutes(),
            cleanup_interval_seconds: default_cleanup_interval_seconds(),
            secure_cookies: default_secure_cookies(),
            cross_site: false,
        }
    }
}

/// Bearer credential signing.
#[derive(Clone, Deserialize)]
pub struct CredentialConfig {
    /// HMAC key for signing bearer credentials.
    pub secret: String,

    /// Accept payload-only credentials minted before signing existed.
    #[serde(default)]
    pub accept_unsigned: bool,
}

impl std::fmt::Debug for CredentialConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialConfig")
            .field("secret", &"<redacted>")
            .field("accept_unsigned", &self.accept_unsigned)
            .finish()
    }
}

/// Shortest accepted credential signing secret, in bytes.
pub const MIN_SECRET_LEN: usize = 16;

impl CredentialConfig {
    /// The codec these settings describe.
    #[must_use]
    pub fn codec(&self) -> CredentialCodec {
        CredentialCodec::new(&self.secret).accepting_unsigned(self.accept_unsigned)
    }
}

/// Cloudinary-compatible upload service.
#[derive(Clone, Deserialize)]
pub struct StorageConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,

    /// Folder uploads land in.
    #[serde(default = "default_storage_folder")]
    pub folder: String,

    /// Base URL of the upload API.
    #[serde(default = "default_storage_api_base")]
    pub api_base: String,
}

fn default_storage_folder() -> String {
    "study-sync-uploads".to_string()
}

fn default_storage_api_base() -> String {
    "https://api.cloudinary.com".to_string()
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("folder", &self.folder)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_source(config::Environment::default())
    }

    fn from_source(source: config::Environment) -> Result<Self, config::ConfigError> {
        let config: Self = config::Config::builder()
            .add_source(source.separator("__").try_parsing(true))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.credential.secret.len() < MIN_SECRET_LEN {
            return Err(config::ConfigError::Message(format!(
                "credential.secret must be at least {MIN_SECRET_LEN} bytes"
            )));
        }
        Ok(())
    }

    /// Origins allowed by CORS: the client URL plus `cors_origins`.
    #[must_use]
    pub fn allowed_origins(&self) -> Vec<String> {
        let mut origins = vec![self.client_url.trim_end_matches('/').to_string()];
        let extra = self.cors_origins.as_deref().unwrap_or_default();
        for origin in extra.split(',').map(|o| o.trim().trim_end_matches('/')) {
            if !origin.is_empty() && !origins.iter().any(|known| known == origin) {
                origins.push(origin.to_string());
            }
        }
        origins
    }
}
