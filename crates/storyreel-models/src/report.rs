//! Story processing artifacts and the final report.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::scene::SceneResult;

/// Narration track synthesized for a whole story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioAsset {
    /// File name inside the audio directory
    pub filename: String,
    /// Full path on disk
    pub path: PathBuf,
    /// Playable duration in seconds, always > 0
    pub duration: f64,
}

impl AudioAsset {
    /// Returns `None` unless `duration` is a positive, finite number.
    pub fn new(filename: impl Into<String>, path: impl Into<PathBuf>, duration: f64) -> Option<Self> {
        if !(duration.is_finite() && duration > 0.0) {
            return None;
        }
        Some(Self {
            filename: filename.into(),
            path: path.into(),
            duration,
        })
    }
}

/// Structured result returned for every processed story.
///
/// Partial outcomes are reported field by field rather than as a single
/// pass/fail flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryReport {
    pub message: String,
    pub scene_image_results: Vec<SceneResult>,
    pub full_audio_filename: Option<String>,
    /// Remote URL of the uploaded video
    pub video_result: Option<String>,
    /// Local file name of the compiled video, kept even if the upload failed
    pub video_filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_error: Option<String>,
}

impl StoryReport {
    pub const COMPLETE_MESSAGE: &'static str = "Story processing complete.";

    /// Image filenames of successful scenes, in scene order.
    pub fn successful_images(&self) -> Vec<&str> {
        self.scene_image_results
            .iter()
            .filter_map(|r| r.image_filename.as_deref())
            .collect()
    }

    /// Number of scenes whose image generation failed.
    pub fn failed_scene_count(&self) -> usize {
        self.scene_image_results
            .iter()
            .filter(|r| !r.is_success())
            .count()
    }
}
