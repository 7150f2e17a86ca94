//! Pipeline error types.

use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    #[error("Scene splitting failed: {0}")]
    SplitFailed(String),

    #[error("Speech synthesis failed: {0}")]
    SpeechFailed(String),

    #[error("Image save failed: {0}")]
    ImageSaveFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Media error: {0}")]
    Media(#[from] storyreel_media::MediaError),

    #[error("Storage error: {0}")]
    Storage(#[from] storyreel_storage::StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn generation_failed(msg: impl Into<String>) -> Self {
        Self::GenerationFailed(msg.into())
    }

    pub fn split_failed(msg: impl Into<String>) -> Self {
        Self::SplitFailed(msg.into())
    }

    pub fn speech_failed(msg: impl Into<String>) -> Self {
        Self::SpeechFailed(msg.into())
    }

    /// Precondition failures rejected before any processing starts.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            PipelineError::ConfigError(_) | PipelineError::InvalidInput(_)
        )
    }
}
