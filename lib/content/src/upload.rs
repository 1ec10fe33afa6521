//! Seam to the binary file storage service.
//!
//! Resources never hold file bytes. A file goes to the storage service
//! first, and the resource records the durable URL and identifier that come
//! back.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use study_sync_core::Result;

use crate::error::UploadError;

/// Where an uploaded file ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    /// Durable public URL of the file.
    pub url: String,
    /// Identifier assigned by the storage service.
    #[serde(alias = "cloudinaryId")]
    pub storage_id: String,
}

/// Accepts file uploads.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Stores `bytes` under the original file `name`.
    async fn upload(&self, name: &str, bytes: Vec<u8>) -> Result<StoredFile, UploadError>;
}
