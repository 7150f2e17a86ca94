//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during media processing.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("Failed to probe duration of {path}: {message}")]
    ProbeFailed { path: PathBuf, message: String },

    #[error("Failed to render segment {path}: {reason}")]
    RenderFailed { path: PathBuf, reason: String },

    #[error("Video compilation failed: {0}")]
    CompileFailed(String),

    #[error("No valid image files were found")]
    NoValidImages,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl MediaError {
    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create a probe failure error.
    pub fn probe_failed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ProbeFailed {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Wrap any failure as a render failure for `path`.
    pub fn render_failed(path: impl Into<PathBuf>, cause: &MediaError) -> Self {
        Self::RenderFailed {
            path: path.into(),
            reason: cause.detail(),
        }
    }

    /// Create a compile failure error.
    pub fn compile_failed(message: impl Into<String>) -> Self {
        Self::CompileFailed(message.into())
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Message plus the tail of ffmpeg's stderr when there is one.
    pub fn detail(&self) -> String {
        match self {
            MediaError::FfmpegFailed {
                message,
                stderr: Some(stderr),
                ..
            } if !stderr.is_empty() => format!("{}: {}", message, stderr),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_failed_keeps_stderr() {
        let cause = MediaError::ffmpeg_failed(
            "FFmpeg exited with non-zero status",
            Some("Invalid data found when processing input".to_string()),
            Some(1),
        );
        let err = MediaError::render_failed("/tmp/seg_0.mp4", &cause);
        let msg = err.to_string();
        assert!(msg.contains("/tmp/seg_0.mp4"));
        assert!(msg.contains("Invalid data found"));
    }
}
