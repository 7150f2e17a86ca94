//! Application state.

use std::sync::Arc;

use tracing::{info, warn};

use storyreel_media::ensure_output_dirs;
use storyreel_pipeline::{PipelineConfig, StoryPipeline};
use storyreel_storage::{R2Client, R2VideoUploader};

use crate::config::ApiConfig;

/// Shared application state.
///
/// The pipeline is absent when the Gemini API key is not configured; story
/// and image requests then fail with a configuration error while `/health`
/// keeps answering.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub pipeline: Option<Arc<StoryPipeline>>,
    pub storage: Option<Arc<R2Client>>,
}

impl AppState {
    pub fn new(config: ApiConfig, pipeline: Option<Arc<StoryPipeline>>) -> Self {
        Self {
            config,
            pipeline,
            storage: None,
        }
    }

    pub fn with_storage(mut self, storage: Arc<R2Client>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Production wiring from environment variables.
    pub async fn from_env(config: ApiConfig) -> anyhow::Result<Self> {
        let pipeline_config = PipelineConfig::from_env();
        let dirs = pipeline_config.output_dirs();
        ensure_output_dirs(&dirs).await?;
        info!("Output root: {}", pipeline_config.output_dir.display());

        let uploader = match R2VideoUploader::from_env() {
            Ok(u) => Some(u.with_timeout(pipeline_config.upload_timeout.as_secs())),
            Err(e) => {
                warn!("R2 storage not configured, uploads will fail: {}", e);
                None
            }
        };
        let storage = uploader.as_ref().map(|u| Arc::new(u.client().clone()));

        let pipeline = match StoryPipeline::from_config(&pipeline_config) {
            Ok(p) => {
                let p = match uploader {
                    Some(u) => p.with_uploader(Arc::new(u)),
                    None => p,
                };
                Some(Arc::new(p))
            }
            Err(e) => {
                warn!("Story pipeline disabled: {}", e);
                None
            }
        };

        Ok(Self {
            config,
            pipeline,
            storage,
        })
    }

    /// The pipeline, or the configuration error clients see without it.
    pub fn pipeline(&self) -> crate::ApiResult<&StoryPipeline> {
        self.pipeline
            .as_deref()
            .ok_or_else(|| crate::ApiError::config("API key missing"))
    }
}
