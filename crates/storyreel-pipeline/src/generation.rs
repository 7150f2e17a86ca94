//! Collaborator contracts for text, image and speech generation.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::PipelineResult;

/// Image returned by an image model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub mime_type: String,
    /// Standard-alphabet base64 payload
    pub data_base64: String,
}

/// Narration file written by a synthesizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedAudio {
    pub path: PathBuf,
    pub filename: String,
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> PipelineResult<String>;
}

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Fails when the model returns no image data.
    async fn generate_image(&self, prompt: &str) -> PipelineResult<GeneratedImage>;
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Write `text` as speech to `<audio dir>/<base_name>.<ext>`.
    async fn synthesize(&self, text: &str, base_name: &str) -> PipelineResult<SynthesizedAudio>;
}
