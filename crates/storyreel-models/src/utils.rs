//! Naming helpers shared across crates.

use chrono::Utc;
use thiserror::Error;

/// Errors that can occur when validating a user-supplied file name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileNameError {
    #[error("File name is empty")]
    Empty,
    #[error("File name must not contain path components")]
    PathTraversal,
    #[error("File name contains invalid characters")]
    InvalidCharacters,
}

/// `<prefix>_<unix millis>`, the base-name scheme for per-request artifacts.
pub fn timestamped_name(prefix: &str) -> String {
    format!("{}_{}", prefix, Utc::now().timestamp_millis())
}

/// Validate a bare file name that will be joined onto an output directory.
///
/// Only ASCII alphanumerics, `-`, `_` and `.` are accepted, and the name
/// may not be `.`/`..` or contain separators.
pub fn validate_file_name(name: &str) -> Result<&str, FileNameError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(FileNameError::Empty);
    }
    if name.contains('/') || name.contains('\\') || name == "." || name.contains("..") {
        return Err(FileNameError::PathTraversal);
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(FileNameError::InvalidCharacters);
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamped_name() {
        let name = timestamped_name("story_video");
        let (prefix, millis) = name.rsplit_once('_').unwrap();
        assert_eq!(prefix, "story_video");
        assert!(millis.parse::<i64>().unwrap() > 0);
    }

    #[test]
    fn test_validate_file_name() {
        assert_eq!(validate_file_name("story_video_1.mp4"), Ok("story_video_1.mp4"));
        assert_eq!(validate_file_name("  "), Err(FileNameError::Empty));
        assert_eq!(validate_file_name("../secret"), Err(FileNameError::PathTraversal));
        assert_eq!(validate_file_name("a/b.mp4"), Err(FileNameError::PathTraversal));
        assert_eq!(validate_file_name("a b.mp4"), Err(FileNameError::InvalidCharacters));
    }
}
