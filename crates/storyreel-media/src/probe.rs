//! FFprobe duration lookup.
//!
//! Two callers want different things from the same probe: the narration
//! track must have a trustworthy duration before it can size segments, while
//! the post-mux sanity check only wants a number to log. [`DurationPolicy`]
//! makes that choice explicit at the call site.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::warn;

use crate::command::check_ffprobe;
use crate::error::{MediaError, MediaResult};

/// Placeholder duration returned by the lenient policy.
pub const DEFAULT_FALLBACK_SECS: f64 = 1.0;

/// How to treat a file whose duration cannot be read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DurationPolicy {
    /// Fail with [`MediaError::ProbeFailed`].
    Strict,
    /// Log a warning and return `fallback` seconds.
    Lenient { fallback: f64 },
}

impl DurationPolicy {
    /// Lenient policy with the default 1 second placeholder.
    pub fn lenient() -> Self {
        Self::Lenient {
            fallback: DEFAULT_FALLBACK_SECS,
        }
    }
}

/// FFprobe JSON output format.
#[derive(Debug, Default, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    duration: Option<String>,
}

fn parse_secs(value: Option<&String>) -> Option<f64> {
    value
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
}

/// Pick a duration from ffprobe JSON: the first stream when it is audio,
/// otherwise the container.
fn extract_duration(output: &FfprobeOutput) -> Option<f64> {
    let from_stream = output
        .streams
        .first()
        .filter(|s| s.codec_type.as_deref() == Some("audio"))
        .and_then(|s| parse_secs(s.duration.as_ref()));

    from_stream.or_else(|| {
        output
            .format
            .as_ref()
            .and_then(|f| parse_secs(f.duration.as_ref()))
    })
}

/// Run ffprobe and read the duration, without applying any policy.
async fn read_duration(path: &Path, timeout: Option<Duration>) -> MediaResult<f64> {
    check_ffprobe()?;

    let probe = Command::new("ffprobe")
        .args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output();

    let output = match timeout {
        Some(limit) => tokio::time::timeout(limit, probe)
            .await
            .map_err(|_| MediaError::Timeout(limit.as_secs()))??,
        None => probe.await?,
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(MediaError::probe_failed(
            path,
            format!("ffprobe exited with {}: {}", output.status, stderr.trim()),
        ));
    }

    let parsed: FfprobeOutput = serde_json::from_slice(&output.stdout)?;
    extract_duration(&parsed).ok_or_else(|| MediaError::probe_failed(path, "no positive duration reported"))
}

/// Probe the playable duration of a media file in seconds.
///
/// A missing file is an error under both policies.
pub async fn probe_duration(path: impl AsRef<Path>, policy: DurationPolicy) -> MediaResult<f64> {
    probe_duration_with_timeout(path, policy, None).await
}

/// [`probe_duration`] bounded by an optional timeout.
pub async fn probe_duration_with_timeout(
    path: impl AsRef<Path>,
    policy: DurationPolicy,
    timeout: Option<Duration>,
) -> MediaResult<f64> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    match (read_duration(path, timeout).await, policy) {
        (Ok(secs), _) => Ok(secs),
        (Err(e), DurationPolicy::Strict) => match e {
            MediaError::ProbeFailed { .. } => Err(e),
            other => Err(MediaError::probe_failed(path, other.to_string())),
        },
        (Err(e), DurationPolicy::Lenient { fallback }) => {
            warn!(
                "Could not read duration of {}, using {}s: {}",
                path.display(),
                fallback,
                e
            );
            Ok(fallback)
        }
    }
}

/// Injection seam for duration probing.
#[async_trait]
pub trait DurationProbe: Send + Sync {
    async fn probe(&self, path: &Path, policy: DurationPolicy) -> MediaResult<f64>;
}

/// [`DurationProbe`] backed by the ffprobe binary.
#[derive(Debug, Clone, Default)]
pub struct FfprobeDurationProbe {
    timeout: Option<Duration>,
}

impl FfprobeDurationProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Some(Duration::from_secs(secs));
        self
    }
}

#[async_trait]
impl DurationProbe for FfprobeDurationProbe {
    async fn probe(&self, path: &Path, policy: DurationPolicy) -> MediaResult<f64> {
        probe_duration_with_timeout(path, policy, self.timeout).await
    }
}
