//! FFmpeg CLI wrapper for reel rendering.
//!
//! This crate provides:
//! - FFmpeg command building and execution
//! - Duration probing with strict and lenient policies
//! - Still-image segment rendering
//! - Timeline compilation (segments + narration into one reel)

pub mod command;
pub mod compile;
pub mod error;
pub mod fs_utils;
pub mod probe;
pub mod progress;
pub mod scratch;
pub mod segment;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use compile::{
    CompileRequest, CompiledVideo, FfmpegEncoder, ReelEncoder, TimelineCompiler, VideoCompiler,
};
pub use error::{MediaError, MediaResult};
pub use fs_utils::{ensure_output_dirs, move_file};
pub use probe::{probe_duration, DurationPolicy, DurationProbe, FfprobeDurationProbe};
pub use progress::FfmpegProgress;
pub use scratch::ScratchFiles;
pub use segment::render_segment;
