//! Reel encoding configuration.

use serde::{Deserialize, Serialize};

/// Reel canvas width in pixels
pub const REEL_WIDTH: u32 = 1080;
/// Reel canvas height in pixels
pub const REEL_HEIGHT: u32 = 1920;
/// Default output frame rate
pub const DEFAULT_FPS: u32 = 30;
/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default audio codec
pub const DEFAULT_AUDIO_CODEC: &str = "aac";
/// Default pixel format, required by most players for H.264
pub const DEFAULT_PIXEL_FORMAT: &str = "yuv420p";
/// Pad color used for letterbox/pillarbox bars
pub const PAD_COLOR: &str = "black";

/// Video encoding configuration for reel output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodingConfig {
    /// Video codec (e.g., "libx264")
    #[serde(default = "default_video_codec")]
    pub codec: String,

    /// Audio codec used when muxing narration
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Output pixel format
    #[serde(default = "default_pixel_format")]
    pub pixel_format: String,

    /// Output frame rate
    #[serde(default = "default_fps")]
    pub fps: u32,
}

fn default_video_codec() -> String {
    DEFAULT_VIDEO_CODEC.to_string()
}
fn default_audio_codec() -> String {
    DEFAULT_AUDIO_CODEC.to_string()
}
fn default_pixel_format() -> String {
    DEFAULT_PIXEL_FORMAT.to_string()
}
fn default_fps() -> u32 {
    DEFAULT_FPS
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            codec: DEFAULT_VIDEO_CODEC.to_string(),
            audio_codec: DEFAULT_AUDIO_CODEC.to_string(),
            pixel_format: DEFAULT_PIXEL_FORMAT.to_string(),
            fps: DEFAULT_FPS,
        }
    }
}

impl EncodingConfig {
    /// Create a new encoding configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new config with updated frame rate.
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    /// Filter that scales a still to fit the reel canvas and pads the rest.
    ///
    /// Aspect ratio is preserved; the output is always exactly
    /// `REEL_WIDTH`x`REEL_HEIGHT` regardless of the source shape.
    pub fn reel_filter() -> String {
        format!(
            "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2:color={c}",
            w = REEL_WIDTH,
            h = REEL_HEIGHT,
            c = PAD_COLOR
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EncodingConfig::default();
        assert_eq!(config.codec, "libx264");
        assert_eq!(config.audio_codec, "aac");
        assert_eq!(config.fps, 30);
    }

    #[test]
    fn test_reel_filter() {
        assert_eq!(
            EncodingConfig::reel_filter(),
            "scale=1080:1920:force_original_aspect_ratio=decrease,pad=1080:1920:(ow-iw)/2:(oh-ih)/2:color=black"
        );
    }

    #[test]
    fn test_serde_defaults() {
        let config: EncodingConfig = serde_json::from_str(r#"{"fps": 24}"#).unwrap();
        assert_eq!(config.fps, 24);
        assert_eq!(config.pixel_format, "yuv420p");
    }
}
