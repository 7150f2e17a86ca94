//! Temporary file tracking for a single compile.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// Set of temporary files removed together.
///
/// Call [`ScratchFiles::release`] on every normal exit path. If the guard is
/// dropped without it (panic or cancelled future) the files are removed
/// synchronously in `Drop`.
#[derive(Debug, Default)]
pub struct ScratchFiles {
    paths: Vec<PathBuf>,
    released: bool,
}

impl ScratchFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `path` and return it for convenience.
    pub fn track(&mut self, path: impl Into<PathBuf>) -> PathBuf {
        let path = path.into();
        self.paths.push(path.clone());
        path
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Remove all tracked files. Files that were never created are ignored.
    pub async fn release(mut self) {
        for path in std::mem::take(&mut self.paths) {
            match fs::remove_file(&path).await {
                Ok(()) => debug!("Removed temp file {}", path.display()),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove temp file {}: {}", path.display(), e),
            }
        }
        self.released = true;
    }
}

impl Drop for ScratchFiles {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        for path in &self.paths {
            remove_quietly(path);
        }
    }
}

fn remove_quietly(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != ErrorKind::NotFound {
            warn!("Failed to remove temp file {}: {}", path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_release_removes_tracked_files() {
        let dir = TempDir::new().unwrap();
        let mut scratch = ScratchFiles::new();
        let a = scratch.track(dir.path().join("a.mp4"));
        let _never_created = scratch.track(dir.path().join("b.mp4"));
        fs::write(&a, b"x").await.unwrap();

        scratch.release().await;

        assert!(!a.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_drop_removes_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("list.txt");
        std::fs::write(&path, "file 'a.mp4'\n").unwrap();

        {
            let mut scratch = ScratchFiles::new();
            scratch.track(&path);
        }

        assert!(!path.exists());
    }
}
