//! Story pipeline stages.

use serde::{Deserialize, Serialize};

/// Stages of a story run, in the order they are entered.
///
/// The run never goes backwards. `AudioFailed` and `NoImages` are terminal
/// branches that skip compilation and upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoryStage {
    #[default]
    Start,
    AudioSynth,
    SceneSplit,
    SceneImages,
    VideoCompile,
    Upload,
    Done,
    AudioFailed,
    NoImages,
}

impl StoryStage {
    /// Get string representation of the stage.
    pub fn as_str(&self) -> &'static str {
        match self {
            StoryStage::Start => "start",
            StoryStage::AudioSynth => "audio_synth",
            StoryStage::SceneSplit => "scene_split",
            StoryStage::SceneImages => "scene_images",
            StoryStage::VideoCompile => "video_compile",
            StoryStage::Upload => "upload",
            StoryStage::Done => "done",
            StoryStage::AudioFailed => "audio_failed",
            StoryStage::NoImages => "no_images",
        }
    }

    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StoryStage::Done | StoryStage::AudioFailed | StoryStage::NoImages
        )
    }
}

impl std::fmt::Display for StoryStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_stages() {
        assert!(StoryStage::Done.is_terminal());
        assert!(StoryStage::NoImages.is_terminal());
        assert!(!StoryStage::VideoCompile.is_terminal());
        assert_eq!(StoryStage::AudioFailed.to_string(), "audio_failed");
    }
}
