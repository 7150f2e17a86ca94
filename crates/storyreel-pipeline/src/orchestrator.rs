//! Story pipeline orchestration.
//!
//! One request runs start to finish on a single task:
//!
//! 1. Narration for the whole story is synthesized and its duration probed.
//!    Failure here is recorded and the run continues without a video.
//! 2. The story is split into scenes. This is the only step after input
//!    validation whose failure aborts the request.
//! 3. Scenes are illustrated one at a time; a failed scene is recorded and
//!    the next one still runs.
//! 4. If narration exists and at least one image was produced, the reel is
//!    compiled and uploaded. Every failure along the way is folded into
//!    `videoError`.

use std::sync::Arc;
use std::time::Instant;

use tracing::Instrument;
use uuid::Uuid;

use storyreel_media::{
    CompileRequest, DurationPolicy, DurationProbe, FfprobeDurationProbe, TimelineCompiler,
    VideoCompiler,
};
use storyreel_models::{
    timestamped_name, validate_file_name, AudioAsset, OutputDirs, Scene, SceneResult, StoryReport,
    StoryStage,
};
use storyreel_storage::{UploadedObject, VideoUploader};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::gemini::GeminiClient;
use crate::generation::{ImageGenerator, SpeechSynthesizer, TextGenerator};
use crate::images::{ImageStore, SavedImage};
use crate::logging::StoryLogger;
use crate::metrics;
use crate::prompts::refine_prompt;
use crate::speech::CommandSpeechSynthesizer;
use crate::splitter::SceneSplitter;

pub const AUDIO_ERROR_PREFIX: &str = "Failed to generate audio for the full story";
pub const SKIPPED_NO_AUDIO: &str = "Video compilation skipped: Full story audio generation failed.";
pub const SKIPPED_NO_IMAGES: &str = "Video compilation skipped: No scene images generated.";

/// Append `message` to the accumulated error, separated by `"; "`.
fn push_error(slot: &mut Option<String>, message: String) {
    *slot = Some(match slot.take() {
        Some(existing) => format!("{}; {}", existing, message),
        None => message,
    });
}

/// Short id used in artifact names for one run.
fn new_run_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Sequences narration, scene splitting, scene images, compilation and upload.
pub struct StoryPipeline {
    text: Arc<dyn TextGenerator>,
    images: Arc<dyn ImageGenerator>,
    speech: Arc<dyn SpeechSynthesizer>,
    probe: Arc<dyn DurationProbe>,
    compiler: Arc<dyn VideoCompiler>,
    uploader: Option<Arc<dyn VideoUploader>>,
    splitter: SceneSplitter,
    store: ImageStore,
    dirs: OutputDirs,
}

impl StoryPipeline {
    pub fn new(
        dirs: OutputDirs,
        text: Arc<dyn TextGenerator>,
        images: Arc<dyn ImageGenerator>,
        speech: Arc<dyn SpeechSynthesizer>,
        probe: Arc<dyn DurationProbe>,
        compiler: Arc<dyn VideoCompiler>,
    ) -> Self {
        Self {
            splitter: SceneSplitter::new(text.clone()),
            store: ImageStore::new(&dirs.images),
            text,
            images,
            speech,
            probe,
            compiler,
            uploader: None,
            dirs,
        }
    }

    /// Upload compiled reels with `uploader`.
    pub fn with_uploader(mut self, uploader: Arc<dyn VideoUploader>) -> Self {
        self.uploader = Some(uploader);
        self
    }

    /// Production wiring: Gemini, the configured TTS program, ffmpeg and ffprobe.
    ///
    /// Fails when the Gemini API key is missing.
    pub fn from_config(config: &PipelineConfig) -> PipelineResult<Self> {
        let dirs = config.output_dirs();
        let gemini = Arc::new(GeminiClient::from_config(config)?);
        let ffmpeg_secs = config.ffmpeg_timeout.as_secs();

        let speech = Arc::new(CommandSpeechSynthesizer::new(
            &config.tts_program,
            &dirs.audio,
            config.tts_timeout,
        ));
        let probe = Arc::new(FfprobeDurationProbe::new().with_timeout(ffmpeg_secs));
        let compiler = Arc::new(TimelineCompiler::new(
            dirs.clone(),
            config.encoding(),
            Some(ffmpeg_secs),
        ));

        Ok(Self::new(dirs, gemini.clone(), gemini, speech, probe, compiler))
    }

    pub fn dirs(&self) -> &OutputDirs {
        &self.dirs
    }

    pub fn splitter(&self) -> &SceneSplitter {
        &self.splitter
    }

    /// Run the full story-to-reel pipeline.
    pub async fn process_story(&self, story: &str) -> PipelineResult<StoryReport> {
        let story = story.trim();
        if story.is_empty() {
            return Err(PipelineError::invalid_input("story must not be empty"));
        }

        let run_id = new_run_id();
        let logger = StoryLogger::new(&run_id, "story_to_reel");
        let span = logger.create_span();
        self.run_story(story, &logger).instrument(span).await
    }

    async fn run_story(&self, story: &str, logger: &StoryLogger) -> PipelineResult<StoryReport> {
        logger.log_stage(StoryStage::Start, &format!("Processing story ({} chars)", story.len()));

        logger.log_stage(StoryStage::AudioSynth, "Synthesizing narration");
        let (audio, audio_error) = match self.synthesize_narration(story).await {
            Ok(audio) => {
                logger.log_stage(
                    StoryStage::AudioSynth,
                    &format!("Narration {} is {:.2}s", audio.filename, audio.duration),
                );
                (Some(audio), None)
            }
            Err(e) => {
                metrics::record_narration_failure();
                let message = format!("{}: {}", AUDIO_ERROR_PREFIX, e);
                logger.log_error(StoryStage::AudioFailed, &message);
                (None, Some(message))
            }
        };

        logger.log_stage(StoryStage::SceneSplit, "Splitting story into scenes");
        let scenes = self.splitter.split(story).await?;
        logger.log_stage(StoryStage::SceneSplit, &format!("{} scenes", scenes.len()));

        let mut scene_results = Vec::with_capacity(scenes.len());
        for scene in &scenes {
            let result = match self.illustrate_scene(logger.run_id(), scene).await {
                Ok(saved) => {
                    logger.log_stage(
                        StoryStage::SceneImages,
                        &format!("Scene {} saved as {}", scene.index, saved.filename),
                    );
                    SceneResult::succeeded(scene, saved.filename)
                }
                Err(e) => {
                    logger.log_warning(
                        StoryStage::SceneImages,
                        &format!("Scene {} failed: {}", scene.index, e),
                    );
                    SceneResult::failed(scene, e.to_string())
                }
            };
            metrics::record_scene(result.is_success());
            scene_results.push(result);
        }

        let image_filenames: Vec<String> = scene_results
            .iter()
            .filter_map(|r| r.image_filename.clone())
            .collect();

        let full_audio_filename = audio.as_ref().map(|a| a.filename.clone());
        let mut video_error = audio_error;
        let mut video_filename = None;
        let mut video_result = None;

        match audio {
            None => {
                if video_error.is_none() {
                    video_error = Some(SKIPPED_NO_AUDIO.to_string());
                }
                logger.log_warning(StoryStage::AudioFailed, SKIPPED_NO_AUDIO);
            }
            Some(_) if image_filenames.is_empty() => {
                if video_error.is_none() {
                    video_error = Some(SKIPPED_NO_IMAGES.to_string());
                }
                logger.log_warning(StoryStage::NoImages, SKIPPED_NO_IMAGES);
            }
            Some(audio) => {
                logger.log_stage(
                    StoryStage::VideoCompile,
                    &format!("Compiling {} images", image_filenames.len()),
                );
                let started = Instant::now();
                let compiled = self
                    .compiler
                    .compile(CompileRequest {
                        image_filenames,
                        audio_filename: audio.filename.clone(),
                        total_audio_duration: audio.duration,
                        output_base_name: Some(timestamped_name("story_video")),
                    })
                    .await;
                metrics::record_compile(compiled.is_ok(), started.elapsed().as_secs_f64());

                match compiled {
                    Ok(video) => {
                        logger.log_stage(
                            StoryStage::Upload,
                            &format!("Uploading {}", video.video_filename),
                        );
                        match self.upload(&video.video_path).await {
                            Ok(uploaded) => video_result = Some(uploaded.secure_url),
                            Err(e) => {
                                logger.log_error(StoryStage::Upload, &e.to_string());
                                push_error(&mut video_error, format!("Video upload error: {}", e));
                            }
                        }
                        video_filename = Some(video.video_filename);
                    }
                    Err(e) => {
                        logger.log_error(StoryStage::VideoCompile, &e.to_string());
                        push_error(&mut video_error, format!("Video compile error: {}", e));
                    }
                }
            }
        }

        let report = StoryReport {
            message: StoryReport::COMPLETE_MESSAGE.to_string(),
            scene_image_results: scene_results,
            full_audio_filename,
            video_result,
            video_filename,
            video_error,
        };
        metrics::record_story(report.video_result.is_some());
        logger.log_completion(&format!(
            "{} scenes, {} failed, video {}",
            report.scene_image_results.len(),
            report.failed_scene_count(),
            report.video_result.as_deref().unwrap_or("none")
        ));
        Ok(report)
    }

    /// Synthesize and strictly probe the narration. Either both succeed with
    /// a positive duration or the run has no audio.
    async fn synthesize_narration(&self, story: &str) -> PipelineResult<AudioAsset> {
        let base_name = timestamped_name("full_story_audio");
        let synthesized = self.speech.synthesize(story, &base_name).await?;
        let duration = self
            .probe
            .probe(&synthesized.path, DurationPolicy::Strict)
            .await?;

        AudioAsset::new(synthesized.filename, synthesized.path, duration).ok_or_else(|| {
            PipelineError::speech_failed(format!("narration duration must be positive, got {}", duration))
        })
    }

    /// Refine the scene text, generate its image and save it.
    async fn illustrate_scene(&self, run_id: &str, scene: &Scene) -> PipelineResult<SavedImage> {
        let prompt = refine_prompt(self.text.as_ref(), &scene.text).await?;
        let image = self.images.generate_image(&prompt).await?;
        let base_name = format!("story_{}_scene_{}", run_id, scene.index);
        self.store.save(&image.data_base64, Some(&base_name)).await
    }

    async fn upload(&self, path: &std::path::Path) -> PipelineResult<UploadedObject> {
        let uploader = self
            .uploader
            .as_ref()
            .ok_or_else(|| PipelineError::config_error("object storage is not configured"))?;

        let started = Instant::now();
        let uploaded = uploader.upload(path).await;
        metrics::record_upload(uploaded.is_ok(), started.elapsed().as_secs_f64());
        Ok(uploaded?)
    }

    /// Refine `prompt`, generate one image and save it under a random name.
    pub async fn generate_single_image(&self, prompt: &str) -> PipelineResult<SavedImage> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(PipelineError::invalid_input("prompt must not be empty"));
        }

        let logger = StoryLogger::new(&new_run_id(), "single_image");
        async {
            let refined = refine_prompt(self.text.as_ref(), prompt).await?;
            let image = self.images.generate_image(&refined).await?;
            let saved = self.store.save(&image.data_base64, None).await?;
            logger.log_completion(&format!("saved {}", saved.filename));
            Ok(saved)
        }
        .instrument(logger.create_span())
        .await
    }

    /// Upload an existing file from the videos directory.
    pub async fn upload_local_video(&self, video_name: &str) -> PipelineResult<UploadedObject> {
        let name = validate_file_name(video_name)
            .map_err(|e| PipelineError::invalid_input(format!("video name '{}': {}", video_name, e)))?;

        let path = self.dirs.video_path(name);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(PipelineError::NotFound(format!(
                "Video file not found: {}",
                path.display()
            )));
        }

        self.upload(&path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use storyreel_media::{CompiledVideo, MediaError, MediaResult};
    use storyreel_storage::{StorageError, StorageResult};
    use tempfile::TempDir;

    use crate::generation::{GeneratedImage, SynthesizedAudio};
    use crate::prompts::SCENE_BREAK;

    /// Splits into three fixed scenes and echoes refinement prompts back.
    struct FakeText {
        split_fails: bool,
    }

    #[async_trait]
    impl TextGenerator for FakeText {
        async fn generate(&self, prompt: &str) -> PipelineResult<String> {
            if prompt.contains(SCENE_BREAK) {
                if self.split_fails {
                    return Err(PipelineError::generation_failed("model unavailable"));
                }
                return Ok(format!(
                    "Scene one{brk}Scene two{brk}Scene three",
                    brk = SCENE_BREAK
                ));
            }
            Ok(prompt.to_string())
        }
    }

    /// Fails for any prompt mentioning one of `fail_on`.
    struct FakeImages {
        fail_on: Vec<&'static str>,
    }

    #[async_trait]
    impl ImageGenerator for FakeImages {
        async fn generate_image(&self, prompt: &str) -> PipelineResult<GeneratedImage> {
            if self.fail_on.iter().any(|m| prompt.contains(m)) {
                return Err(PipelineError::generation_failed("No image data in Gemini response"));
            }
            Ok(GeneratedImage {
                mime_type: "image/png".to_string(),
                data_base64: STANDARD.encode(b"png"),
            })
        }
    }

    struct FakeSpeech {
        dir: PathBuf,
        fails: bool,
    }

    #[async_trait]
    impl SpeechSynthesizer for FakeSpeech {
        async fn synthesize(&self, _text: &str, base_name: &str) -> PipelineResult<SynthesizedAudio> {
            if self.fails {
                return Err(PipelineError::speech_failed("espeak-ng exited with 1"));
            }
            let filename = format!("{}.wav", base_name);
            let path = self.dir.join(&filename);
            tokio::fs::create_dir_all(&self.dir).await?;
            tokio::fs::write(&path, b"wav").await?;
            Ok(SynthesizedAudio { path, filename })
        }
    }

    struct FixedProbe(f64);

    #[async_trait]
    impl DurationProbe for FixedProbe {
        async fn probe(&self, _path: &Path, policy: DurationPolicy) -> MediaResult<f64> {
            assert_eq!(policy, DurationPolicy::Strict);
            Ok(self.0)
        }
    }

    struct RecordingCompiler {
        videos: PathBuf,
        fails: bool,
        requests: Mutex<Vec<CompileRequest>>,
    }

    #[async_trait]
    impl VideoCompiler for RecordingCompiler {
        async fn compile(&self, request: CompileRequest) -> MediaResult<CompiledVideo> {
            self.requests.lock().unwrap().push(request.clone());
            if self.fails {
                return Err(MediaError::compile_failed("concat exited with 1"));
            }
            let video_filename = format!("{}.mp4", request.output_base_name.unwrap());
            Ok(CompiledVideo {
                video_path: self.videos.join(&video_filename),
                video_filename,
                duration: request.total_audio_duration,
            })
        }
    }

    struct FakeUploader {
        fails: bool,
    }

    #[async_trait]
    impl VideoUploader for FakeUploader {
        async fn upload(&self, local_path: &Path) -> StorageResult<UploadedObject> {
            if self.fails {
                return Err(StorageError::upload_failed("bucket unreachable"));
            }
            let name = local_path.file_name().unwrap().to_string_lossy();
            Ok(UploadedObject {
                key: format!("videos/{}", name),
                secure_url: format!("https://cdn.test/videos/{}", name),
                size_bytes: 3,
            })
        }
    }

    struct Harness {
        _root: TempDir,
        pipeline: StoryPipeline,
        compiler: Arc<RecordingCompiler>,
    }

    #[derive(Default)]
    struct Options {
        split_fails: bool,
        image_fail_on: Vec<&'static str>,
        speech_fails: bool,
        duration: Option<f64>,
        compile_fails: bool,
        upload_fails: bool,
    }

    fn harness(opts: Options) -> Harness {
        let root = TempDir::new().unwrap();
        let dirs = OutputDirs::from_root(root.path());
        let compiler = Arc::new(RecordingCompiler {
            videos: dirs.videos.clone(),
            fails: opts.compile_fails,
            requests: Mutex::new(Vec::new()),
        });
        let pipeline = StoryPipeline::new(
            dirs.clone(),
            Arc::new(FakeText {
                split_fails: opts.split_fails,
            }),
            Arc::new(FakeImages {
                fail_on: opts.image_fail_on,
            }),
            Arc::new(FakeSpeech {
                dir: dirs.audio.clone(),
                fails: opts.speech_fails,
            }),
            Arc::new(FixedProbe(opts.duration.unwrap_or(9.0))),
            compiler.clone(),
        )
        .with_uploader(Arc::new(FakeUploader {
            fails: opts.upload_fails,
        }));

        Harness {
            _root: root,
            pipeline,
            compiler,
        }
    }

    #[tokio::test]
    async fn test_failed_scene_is_isolated() {
        let h = harness(Options {
            image_fail_on: vec!["Scene two"],
            ..Default::default()
        });

        let report = h.pipeline.process_story("A three part story.").await.unwrap();

        assert_eq!(report.message, "Story processing complete.");
        assert_eq!(report.scene_image_results.len(), 3);
        let failed: Vec<_> = report
            .scene_image_results
            .iter()
            .filter(|r| r.error.is_some())
            .map(|r| r.scene_index)
            .collect();
        assert_eq!(failed, vec![2]);
        assert!(report.scene_image_results[1].image_filename.is_none());

        let images = report.successful_images();
        assert_eq!(images.len(), 2);
        assert!(images[0].ends_with("_scene_1.png"));
        assert!(images[1].ends_with("_scene_3.png"));

        let requests = h.compiler.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].image_filenames, images);
        assert_eq!(requests[0].total_audio_duration, 9.0);
        assert!(requests[0].output_base_name.as_deref().unwrap().starts_with("story_video_"));

        assert!(report.full_audio_filename.unwrap().starts_with("full_story_audio_"));
        assert!(report.video_result.unwrap().starts_with("https://cdn.test/videos/story_video_"));
        assert!(report.video_error.is_none());
    }

    #[tokio::test]
    async fn test_audio_failure_skips_video_but_keeps_scenes() {
        let h = harness(Options {
            speech_fails: true,
            ..Default::default()
        });

        let report = h.pipeline.process_story("A story.").await.unwrap();

        assert_eq!(report.scene_image_results.len(), 3);
        assert!(report.scene_image_results.iter().all(|r| r.is_success()));
        assert!(report.full_audio_filename.is_none());
        assert!(report.video_result.is_none());
        assert!(report.video_filename.is_none());
        let error = report.video_error.unwrap();
        assert!(error.starts_with("Failed to generate audio for the full story: "));
        assert!(error.contains("espeak-ng exited with 1"));
        assert!(h.compiler.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_non_positive_duration_counts_as_audio_failure() {
        let h = harness(Options {
            duration: Some(0.0),
            ..Default::default()
        });

        let report = h.pipeline.process_story("A story.").await.unwrap();

        assert!(report.full_audio_filename.is_none());
        assert!(report
            .video_error
            .unwrap()
            .starts_with("Failed to generate audio for the full story"));
        assert!(h.compiler.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_no_images_skips_compile() {
        let h = harness(Options {
            image_fail_on: vec!["Scene"],
            ..Default::default()
        });

        let report = h.pipeline.process_story("A story.").await.unwrap();

        assert_eq!(report.failed_scene_count(), 3);
        assert!(report.full_audio_filename.is_some());
        assert_eq!(
            report.video_error.as_deref(),
            Some("Video compilation skipped: No scene images generated.")
        );
        assert!(h.compiler.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_compile_error_is_reported() {
        let h = harness(Options {
            compile_fails: true,
            ..Default::default()
        });

        let report = h.pipeline.process_story("A story.").await.unwrap();

        let error = report.video_error.unwrap();
        assert!(error.starts_with("Video compile error: "));
        assert!(error.contains("concat exited with 1"));
        assert!(report.video_result.is_none());
        assert!(report.video_filename.is_none());
    }

    #[tokio::test]
    async fn test_upload_error_keeps_local_video() {
        let h = harness(Options {
            upload_fails: true,
            ..Default::default()
        });

        let report = h.pipeline.process_story("A story.").await.unwrap();

        assert!(report.video_result.is_none());
        assert!(report.video_filename.unwrap().starts_with("story_video_"));
        let error = report.video_error.unwrap();
        assert!(error.starts_with("Video upload error: "));
        assert!(error.contains("bucket unreachable"));
    }

    #[tokio::test]
    async fn test_split_failure_aborts_request() {
        let h = harness(Options {
            split_fails: true,
            ..Default::default()
        });

        let err = h.pipeline.process_story("A story.").await.unwrap_err();
        assert!(matches!(err, PipelineError::SplitFailed(_)));
    }

    #[tokio::test]
    async fn test_empty_story_is_rejected() {
        let h = harness(Options::default());
        let err = h.pipeline.process_story("   ").await.unwrap_err();
        assert!(err.is_precondition());
    }

    #[test]
    fn test_push_error_joins_with_semicolon() {
        let mut slot = None;
        push_error(&mut slot, "Failed to generate audio for the full story: x".to_string());
        push_error(&mut slot, "Video compile error: y".to_string());
        assert_eq!(
            slot.as_deref(),
            Some("Failed to generate audio for the full story: x; Video compile error: y")
        );
    }

    #[tokio::test]
    async fn test_generate_single_image() {
        let h = harness(Options::default());

        let saved = h.pipeline.generate_single_image("a red fox").await.unwrap();
        assert!(saved.filename.ends_with(".png"));
        assert!(saved.path.exists());

        let err = h.pipeline.generate_single_image("  ").await.unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_upload_local_video() {
        let h = harness(Options::default());
        let dirs = h.pipeline.dirs().clone();
        tokio::fs::create_dir_all(&dirs.videos).await.unwrap();
        tokio::fs::write(dirs.video_path("story_video_1.mp4"), b"mp4").await.unwrap();

        let uploaded = h.pipeline.upload_local_video("story_video_1.mp4").await.unwrap();
        assert_eq!(uploaded.secure_url, "https://cdn.test/videos/story_video_1.mp4");

        assert!(matches!(
            h.pipeline.upload_local_video("../secrets.mp4").await,
            Err(PipelineError::InvalidInput(_))
        ));
        assert!(matches!(
            h.pipeline.upload_local_video("missing.mp4").await,
            Err(PipelineError::NotFound(_))
        ));
    }
}
