//! Video upload contract and its R2 implementation.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::client::{R2Client, R2Config};
use crate::error::{StorageError, StorageResult};

/// Lifetime of presigned links when the bucket has no public base URL.
/// Seven days is the longest expiry SigV4 allows.
pub const PRESIGN_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

const VIDEO_CONTENT_TYPE: &str = "video/mp4";

/// Remote descriptor of an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedObject {
    pub key: String,
    /// https URL the caller can hand to a browser
    pub secure_url: String,
    pub size_bytes: u64,
}

/// Uploads a local file and returns where it can be fetched from.
#[async_trait]
pub trait VideoUploader: Send + Sync {
    async fn upload(&self, local_path: &Path) -> StorageResult<UploadedObject>;
}

/// `prefix/filename` with no leading, trailing or doubled slashes.
pub fn object_key(prefix: &str, filename: &str) -> String {
    let prefix = prefix.trim_matches('/');
    let filename = filename.trim_start_matches('/');
    if prefix.is_empty() {
        filename.to_string()
    } else {
        format!("{}/{}", prefix, filename)
    }
}

/// [`VideoUploader`] that writes into an R2 bucket.
#[derive(Clone)]
pub struct R2VideoUploader {
    client: R2Client,
    config: R2Config,
    timeout: Option<Duration>,
}

impl R2VideoUploader {
    pub fn new(config: R2Config) -> StorageResult<Self> {
        config.validate()?;
        Ok(Self {
            client: R2Client::new(&config),
            config,
            timeout: None,
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Self::new(R2Config::from_env()?)
    }

    /// Bound each upload.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Some(Duration::from_secs(secs));
        self
    }

    pub fn client(&self) -> &R2Client {
        &self.client
    }

    async fn secure_url(&self, key: &str) -> StorageResult<String> {
        match self.config.public_url(key) {
            Some(url) => Ok(url),
            None => self.client.presign_get(key, PRESIGN_TTL).await,
        }
    }
}

#[async_trait]
impl VideoUploader for R2VideoUploader {
    async fn upload(&self, local_path: &Path) -> StorageResult<UploadedObject> {
        let metadata = match tokio::fs::metadata(local_path).await {
            Ok(m) if m.is_file() => m,
            _ => return Err(StorageError::not_found(local_path.display().to_string())),
        };

        let filename = local_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| StorageError::InvalidKey(local_path.display().to_string()))?;
        let key = object_key(&self.config.key_prefix, filename);

        let put = self.client.upload_file(local_path, &key, VIDEO_CONTENT_TYPE);
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, put)
                .await
                .map_err(|_| StorageError::Timeout(limit.as_secs()))??,
            None => put.await?,
        }

        let secure_url = self.secure_url(&key).await?;
        info!("Video available at {}", secure_url);

        Ok(UploadedObject {
            key,
            secure_url,
            size_bytes: metadata.len(),
        })
    }
}
