//! Signed uploads to a Cloudinary-compatible storage service.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use study_sync_content::{FileStorage, StoredFile, UploadError};
use study_sync_core::Result;
use tracing::{debug, instrument};

use crate::config::StorageConfig;

#[derive(Deserialize)]
struct UploadReply {
    secure_url: String,
    public_id: String,
}

/// [`FileStorage`] over the upload API.
pub struct CloudinaryStorage {
    http: reqwest::Client,
    upload_url: String,
    api_key: String,
    api_secret: String,
    folder: String,
}

impl CloudinaryStorage {
    #[must_use]
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            upload_url: format!(
                "{}/v1_1/{}/auto/upload",
                config.api_base.trim_end_matches('/'),
                config.cloud_name
            ),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            folder: config.folder.clone(),
        }
    }

    /// SHA-256 over the signed parameters in name order, then the secret.
    fn signature(&self, timestamp: i64) -> String {
        let to_sign = format!(
            "folder={}&timestamp={timestamp}{}",
            self.folder, self.api_secret
        );
        hex::encode(Sha256::digest(to_sign.as_bytes()))
    }
}

#[async_trait]
impl FileStorage for CloudinaryStorage {
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn upload(&self, name: &str, bytes: Vec<u8>) -> Result<StoredFile, UploadError> {
        let timestamp = Utc::now().timestamp();
        let form = Form::new()
            .part("file", Part::bytes(bytes).file_name(name.to_string()))
            .text("api_key", self.api_key.clone())
            .text("folder", self.folder.clone())
            .text("timestamp", timestamp.to_string())
            .text("signature_algorithm", "sha256")
            .text("signature", self.signature(timestamp));

        let response = self
            .http
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploadError::Transport {
                details: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let details = response.text().await.unwrap_or_default();
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                details,
            }
            .into());
        }

        let reply: UploadReply = response
            .json()
            .await
            .map_err(|e| UploadError::MalformedReply {
                details: e.to_string(),
            })?;
        debug!(storage_id = %reply.public_id, "file stored");

        Ok(StoredFile {
            url: reply.secure_url,
            storage_id: reply.public_id,
        })
    }
}
