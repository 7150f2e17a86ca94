//! Persist generated images as PNG files.

use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::debug;
use uuid::Uuid;

use storyreel_models::validate_file_name;

use crate::error::{PipelineError, PipelineResult};

/// Image written to the images directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedImage {
    pub path: PathBuf,
    pub filename: String,
}

/// Writes decoded image payloads into one directory.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }

    /// Decode `data_base64` and write it as `<base_name>.png`, or under a
    /// random name when no base name is given.
    pub async fn save(&self, data_base64: &str, base_name: Option<&str>) -> PipelineResult<SavedImage> {
        let data_base64 = data_base64.trim();
        if data_base64.is_empty() {
            return Err(PipelineError::ImageSaveFailed("image data is empty".to_string()));
        }

        let bytes = STANDARD
            .decode(data_base64)
            .map_err(|e| PipelineError::ImageSaveFailed(format!("invalid base64 image data: {}", e)))?;
        if bytes.is_empty() {
            return Err(PipelineError::ImageSaveFailed("image data is empty".to_string()));
        }

        let base = match base_name {
            Some(name) => validate_file_name(name)
                .map_err(|e| PipelineError::invalid_input(format!("image name '{}': {}", name, e)))?
                .to_string(),
            None => Uuid::new_v4().to_string(),
        };
        let filename = format!("{}.png", base);
        let path = self.dir.join(&filename);

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&path, &bytes).await?;
        debug!("Saved image {} ({} bytes)", path.display(), bytes.len());

        Ok(SavedImage { path, filename })
    }
}
