//! Pipeline configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use storyreel_models::encoding::DEFAULT_FPS;
use storyreel_models::{EncodingConfig, OutputDirs};

use crate::error::{PipelineError, PipelineResult};

pub const DEFAULT_TEXT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.0-flash-exp-image-generation";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_TTS_PROGRAM: &str = "espeak-ng";

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Gemini API key; requests are rejected while this is unset
    pub google_api_key: Option<String>,
    /// Root of the output tree (images, audio/, videos/, temp/)
    pub output_dir: PathBuf,
    /// Model used for prompt refinement and scene splitting
    pub text_model: String,
    /// Model used for scene images
    pub image_model: String,
    pub gemini_base_url: String,
    /// Reel frame rate
    pub fps: u32,
    /// Text-to-speech executable
    pub tts_program: String,
    /// Timeout for one Gemini HTTP request
    pub gemini_timeout: Duration,
    /// Timeout for one ffmpeg/ffprobe invocation
    pub ffmpeg_timeout: Duration,
    /// Timeout for narration synthesis
    pub tts_timeout: Duration,
    /// Timeout for one video upload
    pub upload_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            google_api_key: None,
            output_dir: PathBuf::from("outputs"),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            fps: DEFAULT_FPS,
            tts_program: DEFAULT_TTS_PROGRAM.to_string(),
            gemini_timeout: Duration::from_secs(120),
            ffmpeg_timeout: Duration::from_secs(600),
            tts_timeout: Duration::from_secs(300),
            upload_timeout: Duration::from_secs(300),
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn env_secs(key: &str, default: Duration) -> Duration {
    Duration::from_secs(env_or(key, default.as_secs()))
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            google_api_key: std::env::var("GOOGLE_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            output_dir: std::env::var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            text_model: std::env::var("GEMINI_TEXT_MODEL").unwrap_or(defaults.text_model),
            image_model: std::env::var("GEMINI_IMAGE_MODEL").unwrap_or(defaults.image_model),
            gemini_base_url: std::env::var("GEMINI_BASE_URL").unwrap_or(defaults.gemini_base_url),
            fps: env_or("REEL_FPS", defaults.fps).max(1),
            tts_program: std::env::var("TTS_PROGRAM").unwrap_or(defaults.tts_program),
            gemini_timeout: env_secs("GEMINI_TIMEOUT_SECS", defaults.gemini_timeout),
            ffmpeg_timeout: env_secs("FFMPEG_TIMEOUT_SECS", defaults.ffmpeg_timeout),
            tts_timeout: env_secs("TTS_TIMEOUT_SECS", defaults.tts_timeout),
            upload_timeout: env_secs("UPLOAD_TIMEOUT_SECS", defaults.upload_timeout),
        }
    }

    /// The API key, or a configuration error when it is missing.
    pub fn require_api_key(&self) -> PipelineResult<&str> {
        self.google_api_key
            .as_deref()
            .ok_or_else(|| PipelineError::config_error("GOOGLE_API_KEY is not set"))
    }

    pub fn output_dirs(&self) -> OutputDirs {
        OutputDirs::from_root(&self.output_dir)
    }

    pub fn encoding(&self) -> EncodingConfig {
        EncodingConfig::default().with_fps(self.fps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.text_model, "gemini-1.5-flash");
        assert_eq!(config.output_dirs().videos, PathBuf::from("outputs/videos"));
        assert_eq!(config.encoding().fps, 30);
        assert_eq!(config.ffmpeg_timeout, Duration::from_secs(600));
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let config = PipelineConfig::default();
        assert!(matches!(
            config.require_api_key(),
            Err(PipelineError::ConfigError(_))
        ));

        let config = PipelineConfig {
            google_api_key: Some("k".to_string()),
            ..Default::default()
        };
        assert_eq!(config.require_api_key().unwrap(), "k");
    }
}
