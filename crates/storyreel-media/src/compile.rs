//! Timeline compilation: still images plus one narration track into a reel.
//!
//! A compile filters the requested images down to the ones present on disk,
//! splits the narration duration evenly across them, renders one silent
//! segment per image concurrently, concatenates the segments in order via the
//! concat demuxer and muxes the narration on top. Every temporary file lives
//! in the temp directory under a per-compile id and is removed before
//! `compile` returns, whatever the outcome.

use async_trait::async_trait;
use futures::future::try_join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

use storyreel_models::{timestamped_name, validate_file_name, EncodingConfig, OutputDirs};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::fs_utils::move_file;
use crate::probe::{DurationPolicy, DurationProbe, FfprobeDurationProbe};
use crate::scratch::ScratchFiles;
use crate::segment;

/// Output drift (seconds) above which the muxed duration is reported.
const DRIFT_WARN_SECS: f64 = 0.5;

/// Input to a single compile.
#[derive(Debug, Clone)]
pub struct CompileRequest {
    /// Image files in timeline order, relative to the images directory
    pub image_filenames: Vec<String>,
    /// Narration file, relative to the audio directory
    pub audio_filename: String,
    /// Narration length in seconds; must be positive
    pub total_audio_duration: f64,
    /// Base name of the output file, without extension
    pub output_base_name: Option<String>,
}

/// A compiled reel on local disk.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledVideo {
    pub video_path: PathBuf,
    pub video_filename: String,
    /// Planned duration, the sum of all segment durations
    pub duration: f64,
}

/// Anything that can turn an ordered image list plus narration into a reel.
#[async_trait]
pub trait VideoCompiler: Send + Sync {
    async fn compile(&self, request: CompileRequest) -> MediaResult<CompiledVideo>;
}

/// Encoding steps used by [`TimelineCompiler`].
#[async_trait]
pub trait ReelEncoder: Send + Sync {
    /// Render a silent clip of `duration` seconds from a still image.
    async fn render_segment(&self, image: &Path, duration: f64, output: &Path) -> MediaResult<()>;

    /// Concatenate the segments listed in `manifest` and mux `audio` on top.
    async fn concat_with_audio(&self, manifest: &Path, audio: &Path, output: &Path) -> MediaResult<()>;
}

/// [`ReelEncoder`] that shells out to ffmpeg.
#[derive(Debug, Clone, Default)]
pub struct FfmpegEncoder {
    encoding: EncodingConfig,
    timeout_secs: Option<u64>,
}

impl FfmpegEncoder {
    pub fn new(encoding: EncodingConfig) -> Self {
        Self {
            encoding,
            timeout_secs: None,
        }
    }

    /// Bound each ffmpeg invocation.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Concat-demux the manifest as video, take audio from the narration, and
    /// stop at the shorter of the two.
    pub fn concat_command(&self, manifest: &Path, audio: &Path, output: &Path) -> FfmpegCommand {
        FfmpegCommand::new(manifest, output)
            .concat_demuxer()
            .add_input(audio)
            .map("0:v")
            .map("1:a")
            .video_codec(&self.encoding.codec)
            .audio_codec(&self.encoding.audio_codec)
            .pixel_format(&self.encoding.pixel_format)
            .shortest()
    }
}

#[async_trait]
impl ReelEncoder for FfmpegEncoder {
    async fn render_segment(&self, image: &Path, duration: f64, output: &Path) -> MediaResult<()> {
        segment::render_segment(
            image,
            duration,
            output,
            self.encoding.fps,
            &self.encoding,
            self.timeout_secs,
        )
        .await
    }

    async fn concat_with_audio(&self, manifest: &Path, audio: &Path, output: &Path) -> MediaResult<()> {
        let cmd = self.concat_command(manifest, audio, output);
        FfmpegRunner::new()
            .with_optional_timeout(self.timeout_secs)
            .run(&cmd)
            .await
            .map_err(|e| MediaError::compile_failed(e.detail()))
    }
}

/// Quote a path for an ffmpeg concat manifest line.
fn manifest_entry(path: &Path) -> String {
    let normalized = path.to_string_lossy().replace('\\', "/");
    format!("file '{}'", normalized.replace('\'', "'\\''"))
}

/// Build the concat manifest body for `segments`, in order.
pub fn build_manifest(segments: &[PathBuf]) -> String {
    let mut body = String::new();
    for seg in segments {
        body.push_str(&manifest_entry(seg));
        body.push('\n');
    }
    body
}

/// Compiler that renders through a [`ReelEncoder`].
pub struct TimelineCompiler<E = FfmpegEncoder> {
    dirs: OutputDirs,
    encoder: E,
    probe: Arc<dyn DurationProbe>,
}

impl TimelineCompiler<FfmpegEncoder> {
    /// Compiler backed by ffmpeg and ffprobe.
    pub fn new(dirs: OutputDirs, encoding: EncodingConfig, timeout_secs: Option<u64>) -> Self {
        let mut encoder = FfmpegEncoder::new(encoding);
        let mut probe = FfprobeDurationProbe::new();
        if let Some(secs) = timeout_secs {
            encoder = encoder.with_timeout(secs);
            probe = probe.with_timeout(secs);
        }
        Self::with_encoder(dirs, encoder, Arc::new(probe))
    }
}

impl<E: ReelEncoder> TimelineCompiler<E> {
    pub fn with_encoder(dirs: OutputDirs, encoder: E, probe: Arc<dyn DurationProbe>) -> Self {
        Self { dirs, encoder, probe }
    }

    pub fn dirs(&self) -> &OutputDirs {
        &self.dirs
    }

    /// Keep requested images that exist on disk, in order.
    async fn existing_images(&self, filenames: &[String]) -> Vec<PathBuf> {
        let mut valid = Vec::with_capacity(filenames.len());
        for name in filenames {
            let path = self.dirs.image_path(name);
            if fs::try_exists(&path).await.unwrap_or(false) {
                valid.push(path);
            } else {
                warn!("Image file not found, skipping: {}", path.display());
            }
        }
        valid
    }

    async fn run_stages(
        &self,
        images: &[PathBuf],
        segment_duration: f64,
        audio: &Path,
        scratch: &mut ScratchFiles,
        final_path: &Path,
    ) -> MediaResult<()> {
        fs::create_dir_all(&self.dirs.temp).await?;
        // The demuxer resolves relative entries against the manifest's own
        // directory, so every entry is written absolute.
        let temp = fs::canonicalize(&self.dirs.temp).await?;
        let compile_id = Uuid::new_v4().simple().to_string();

        let segments: Vec<PathBuf> = (0..images.len())
            .map(|i| scratch.track(temp.join(format!("seg_{}_{:03}.mp4", compile_id, i))))
            .collect();
        let manifest = scratch.track(temp.join(format!("concat_{}.txt", compile_id)));
        let muxed = scratch.track(temp.join(format!("mux_{}.mp4", compile_id)));

        debug!(
            "Rendering {} segments of {:.3}s (compile {})",
            segments.len(),
            segment_duration,
            compile_id
        );

        let renders = images
            .iter()
            .zip(&segments)
            .map(|(image, seg)| self.encoder.render_segment(image, segment_duration, seg));
        try_join_all(renders)
            .await
            .map_err(|e| MediaError::compile_failed(e.to_string()))?;

        fs::write(&manifest, build_manifest(&segments)).await?;

        self.encoder
            .concat_with_audio(&manifest, audio, &muxed)
            .await
            .map_err(|e| match e {
                MediaError::CompileFailed(_) => e,
                other => MediaError::compile_failed(other.detail()),
            })?;

        move_file(&muxed, final_path).await
    }
}

#[async_trait]
impl<E: ReelEncoder> VideoCompiler for TimelineCompiler<E> {
    async fn compile(&self, request: CompileRequest) -> MediaResult<CompiledVideo> {
        let total = request.total_audio_duration;
        if !(total.is_finite() && total > 0.0) {
            return Err(MediaError::invalid_input(format!(
                "total audio duration must be positive, got {}",
                total
            )));
        }

        let base_name = match request.output_base_name {
            Some(name) => validate_file_name(&name)
                .map_err(|e| MediaError::invalid_input(format!("output name '{}': {}", name, e)))?
                .to_string(),
            None => timestamped_name("video"),
        };
        let video_filename = format!("{}.mp4", base_name);
        let final_path = self.dirs.video_path(&video_filename);

        let audio = self.dirs.audio_path(&request.audio_filename);
        if !fs::try_exists(&audio).await.unwrap_or(false) {
            return Err(MediaError::FileNotFound(audio));
        }

        let images = self.existing_images(&request.image_filenames).await;
        if images.is_empty() {
            return Err(MediaError::NoValidImages);
        }

        let segment_duration = total / images.len() as f64;
        info!(
            "Compiling {} ({} images, {:.3}s each, {:.3}s total)",
            video_filename,
            images.len(),
            segment_duration,
            total
        );

        let mut scratch = ScratchFiles::new();
        let result = self
            .run_stages(&images, segment_duration, &audio, &mut scratch, &final_path)
            .await;
        scratch.release().await;
        // The move into videos/ is the last stage, so a failure never leaves a final file
        result?;

        let actual = self.probe.probe(&final_path, DurationPolicy::lenient()).await?;
        if (actual - total).abs() > DRIFT_WARN_SECS {
            warn!(
                "Compiled {} runs {:.3}s, planned {:.3}s",
                video_filename, actual, total
            );
        }

        Ok(CompiledVideo {
            video_path: final_path,
            video_filename,
            duration: segment_duration * images.len() as f64,
        })
    }
}
