//! Shared data models for the StoryReel backend.
//!
//! This crate provides Serde-serializable types for:
//! - Scenes and per-scene image results
//! - Narration audio and the final story report
//! - Output directory layout
//! - Reel encoding configuration
//! - Pipeline stages

pub mod dirs;
pub mod encoding;
pub mod report;
pub mod scene;
pub mod stage;
pub mod utils;

// Re-export common types
pub use dirs::OutputDirs;
pub use encoding::EncodingConfig;
pub use report::{AudioAsset, StoryReport};
pub use scene::{Scene, SceneResult};
pub use stage::StoryStage;
pub use utils::{timestamped_name, validate_file_name, FileNameError};
