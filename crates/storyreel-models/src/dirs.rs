//! Output directory layout.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Directory roots shared by the pipeline components.
///
/// Passed explicitly into every component so tests can point each run at
/// its own temporary root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputDirs {
    /// Generated scene images
    pub images: PathBuf,
    /// Narration audio
    pub audio: PathBuf,
    /// Compiled videos
    pub videos: PathBuf,
    /// Segment clips and concat manifests, emptied after every compile
    pub temp: PathBuf,
}

impl OutputDirs {
    /// Standard layout under a single root: `root/`, `root/audio`,
    /// `root/videos` and `root/temp`.
    pub fn from_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            images: root.to_path_buf(),
            audio: root.join("audio"),
            videos: root.join("videos"),
            temp: root.join("temp"),
        }
    }

    /// All directories, in creation order.
    pub fn all(&self) -> [&Path; 4] {
        [&self.images, &self.audio, &self.videos, &self.temp]
    }

    pub fn image_path(&self, filename: &str) -> PathBuf {
        self.images.join(filename)
    }

    pub fn audio_path(&self, filename: &str) -> PathBuf {
        self.audio.join(filename)
    }

    pub fn video_path(&self, filename: &str) -> PathBuf {
        self.videos.join(filename)
    }
}

impl Default for OutputDirs {
    fn default() -> Self {
        Self::from_root("outputs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_root_layout() {
        let dirs = OutputDirs::from_root("/srv/out");
        assert_eq!(dirs.images, PathBuf::from("/srv/out"));
        assert_eq!(dirs.audio, PathBuf::from("/srv/out/audio"));
        assert_eq!(dirs.videos, PathBuf::from("/srv/out/videos"));
        assert_eq!(dirs.temp, PathBuf::from("/srv/out/temp"));
        assert_eq!(dirs.video_path("a.mp4"), PathBuf::from("/srv/out/videos/a.mp4"));
    }
}
