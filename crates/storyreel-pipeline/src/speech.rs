//! Narration synthesis through an OS text-to-speech program.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::{PipelineError, PipelineResult};
use crate::generation::{SpeechSynthesizer, SynthesizedAudio};

/// Voice passed to the TTS program
pub const DEFAULT_VOICE: &str = "en";
/// Speaking rate in words per minute
pub const DEFAULT_WORDS_PER_MINUTE: u32 = 160;

/// Runs an espeak-compatible program: text on stdin, WAV written via `-w`.
#[derive(Debug, Clone)]
pub struct CommandSpeechSynthesizer {
    program: String,
    audio_dir: PathBuf,
    timeout: Duration,
}

impl CommandSpeechSynthesizer {
    pub fn new(program: impl Into<String>, audio_dir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            audio_dir: audio_dir.into(),
            timeout,
        }
    }

    /// Run the TTS program into `path` and return the written size.
    async fn run_program(&self, text: &str, path: &Path) -> PipelineResult<u64> {
        let mut child = Command::new(&self.program)
            .arg("-v")
            .arg(DEFAULT_VOICE)
            .arg("-s")
            .arg(DEFAULT_WORDS_PER_MINUTE.to_string())
            .arg("-w")
            .arg(path)
            .arg("--stdin")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| PipelineError::speech_failed(format!("failed to start {}: {}", self.program, e)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| PipelineError::speech_failed("stdin was not captured"))?;
        let input = text.as_bytes().to_vec();
        let writer = tokio::spawn(async move {
            stdin.write_all(&input).await?;
            stdin.shutdown().await
        });

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                PipelineError::speech_failed(format!("timed out after {} seconds", self.timeout.as_secs()))
            })??;
        let _ = writer.await;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PipelineError::speech_failed(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let size = tokio::fs::metadata(path).await.map(|m| m.len()).unwrap_or(0);
        if size == 0 {
            return Err(PipelineError::speech_failed(format!(
                "{} produced no audio at {}",
                self.program,
                path.display()
            )));
        }
        Ok(size)
    }
}

#[async_trait]
impl SpeechSynthesizer for CommandSpeechSynthesizer {
    async fn synthesize(&self, text: &str, base_name: &str) -> PipelineResult<SynthesizedAudio> {
        if text.trim().is_empty() {
            return Err(PipelineError::speech_failed("no text to synthesize"));
        }

        tokio::fs::create_dir_all(&self.audio_dir).await?;
        let filename = format!("{}.wav", base_name);
        let path = self.audio_dir.join(&filename);

        debug!("Synthesizing {} chars to {}", text.len(), path.display());

        let size = match self.run_program(text, &path).await {
            Ok(size) => size,
            Err(e) => {
                // Failed runs may leave a truncated file behind
                if let Err(rm) = tokio::fs::remove_file(&path).await {
                    if rm.kind() != std::io::ErrorKind::NotFound {
                        warn!("Failed to remove partial narration {}: {}", path.display(), rm);
                    }
                }
                return Err(e);
            }
        };

        info!("Narration written to {} ({} bytes)", path.display(), size);
        Ok(SynthesizedAudio { path, filename })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    /// Fake TTS that copies stdin into the `-w` target, then runs `tail`.
    fn tts_script(dir: &std::path::Path, tail: &str) -> PathBuf {
        let script = dir.join("fake-tts");
        std::fs::write(
            &script,
            format!(
                "#!/bin/sh\nwhile [ $# -gt 0 ]; do\n  if [ \"$1\" = \"-w\" ]; then out=\"$2\"; fi\n  shift\ndone\ncat > \"$out\"\n{}\n",
                tail
            ),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        script
    }

    fn fake_tts(dir: &std::path::Path) -> PathBuf {
        tts_script(dir, "")
    }

    #[tokio::test]
    async fn test_synthesize_writes_wav() {
        let dir = TempDir::new().unwrap();
        let tts = fake_tts(dir.path());
        let synth = CommandSpeechSynthesizer::new(
            tts.to_string_lossy(),
            dir.path().join("audio"),
            Duration::from_secs(10),
        );

        let audio = synth.synthesize("Once upon a time.", "full_story_audio_1").await.unwrap();

        assert_eq!(audio.filename, "full_story_audio_1.wav");
        assert_eq!(std::fs::read_to_string(&audio.path).unwrap(), "Once upon a time.");
    }

    #[tokio::test]
    async fn test_failing_program_is_speech_error() {
        let dir = TempDir::new().unwrap();
        let synth = CommandSpeechSynthesizer::new("false", dir.path(), Duration::from_secs(10));

        let err = synth.synthesize("hello", "narration").await.unwrap_err();
        assert!(matches!(err, PipelineError::SpeechFailed(_)));
    }

    #[tokio::test]
    async fn test_missing_program_is_speech_error() {
        let dir = TempDir::new().unwrap();
        let synth = CommandSpeechSynthesizer::new(
            "/nonexistent/espeak-ng",
            dir.path(),
            Duration::from_secs(10),
        );

        let err = synth.synthesize("hello", "narration").await.unwrap_err();
        assert!(err.to_string().contains("failed to start"));
    }

    #[tokio::test]
    async fn test_failed_run_removes_partial_wav() {
        let dir = TempDir::new().unwrap();
        let tts = tts_script(dir.path(), "echo 'voice crashed' >&2\nexit 1");
        let audio_dir = dir.path().join("audio");
        let synth = CommandSpeechSynthesizer::new(tts.to_string_lossy(), audio_dir.clone(), Duration::from_secs(10));

        let err = synth.synthesize("Once upon a time.", "full_story_audio_2").await.unwrap_err();

        assert!(matches!(err, PipelineError::SpeechFailed(_)));
        assert!(err.to_string().contains("voice crashed"));
        assert!(!audio_dir.join("full_story_audio_2.wav").exists());
    }

    #[tokio::test]
    async fn test_timed_out_run_removes_partial_wav() {
        let dir = TempDir::new().unwrap();
        let tts = tts_script(dir.path(), "exec sleep 5");
        let audio_dir = dir.path().join("audio");
        let synth = CommandSpeechSynthesizer::new(tts.to_string_lossy(), audio_dir.clone(), Duration::from_secs(1));

        let err = synth.synthesize("Once upon a time.", "full_story_audio_3").await.unwrap_err();

        assert!(err.to_string().contains("timed out"));
        assert!(!audio_dir.join("full_story_audio_3.wav").exists());
    }
}
