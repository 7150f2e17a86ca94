//! Story-to-reel pipeline.
//!
//! This crate provides:
//! - Gemini text and image generation
//! - Scene splitting and prompt refinement
//! - Narration synthesis and image persistence
//! - The story pipeline orchestrator
//! - Structured run logging and pipeline metrics

pub mod config;
pub mod error;
pub mod gemini;
pub mod generation;
pub mod images;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod prompts;
pub mod speech;
pub mod splitter;

pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use gemini::GeminiClient;
pub use generation::{GeneratedImage, ImageGenerator, SpeechSynthesizer, SynthesizedAudio, TextGenerator};
pub use images::{ImageStore, SavedImage};
pub use logging::StoryLogger;
pub use orchestrator::StoryPipeline;
pub use speech::CommandSpeechSynthesizer;
pub use splitter::{parse_scenes, SceneSplitter};
