//! Still-image segment rendering.

use std::path::Path;
use tracing::debug;

use storyreel_models::EncodingConfig;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Build the ffmpeg invocation for one segment.
///
/// The still is looped at `fps`, fitted into the reel canvas with black
/// padding, and cut to exactly `duration` seconds with no audio track.
pub fn segment_command(
    image: &Path,
    duration: f64,
    output: &Path,
    fps: u32,
    encoding: &EncodingConfig,
) -> FfmpegCommand {
    FfmpegCommand::new(image, output)
        .loop_input()
        .input_framerate(fps)
        .video_filter(EncodingConfig::reel_filter())
        .video_codec(&encoding.codec)
        .pixel_format(&encoding.pixel_format)
        .output_framerate(fps)
        .duration(duration)
        .no_audio()
}

/// Render `image` into a silent reel clip of `duration` seconds at `output`.
pub async fn render_segment(
    image: impl AsRef<Path>,
    duration: f64,
    output: impl AsRef<Path>,
    fps: u32,
    encoding: &EncodingConfig,
    timeout_secs: Option<u64>,
) -> MediaResult<()> {
    let image = image.as_ref();
    let output = output.as_ref();

    if !(duration.is_finite() && duration > 0.0) {
        return Err(MediaError::render_failed(
            output,
            &MediaError::invalid_input(format!("segment duration must be positive, got {}", duration)),
        ));
    }
    if fps == 0 {
        return Err(MediaError::render_failed(
            output,
            &MediaError::invalid_input("frame rate must be positive"),
        ));
    }
    if !image.exists() {
        return Err(MediaError::render_failed(
            output,
            &MediaError::FileNotFound(image.to_path_buf()),
        ));
    }

    debug!(
        "Rendering segment {} from {} ({:.3}s @ {}fps)",
        output.display(),
        image.display(),
        duration,
        fps
    );

    let cmd = segment_command(image, duration, output, fps, encoding);
    FfmpegRunner::new()
        .with_optional_timeout(timeout_secs)
        .run(&cmd)
        .await
        .map_err(|e| MediaError::render_failed(output, &e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arg_after<'a>(args: &'a [String], flag: &str) -> &'a str {
        let pos = args.iter().position(|a| a == flag).unwrap();
        &args[pos + 1]
    }

    #[test]
    fn test_segment_command_args() {
        let encoding = EncodingConfig::default();
        let args = segment_command(
            Path::new("scene_1.png"),
            4.5,
            Path::new("seg_0.mp4"),
            30,
            &encoding,
        )
        .build_args();

        assert_eq!(arg_after(&args, "-loop"), "1");
        assert_eq!(arg_after(&args, "-framerate"), "30");
        assert_eq!(arg_after(&args, "-i"), "scene_1.png");
        assert_eq!(
            arg_after(&args, "-vf"),
            "scale=1080:1920:force_original_aspect_ratio=decrease,pad=1080:1920:(ow-iw)/2:(oh-ih)/2:color=black"
        );
        assert_eq!(arg_after(&args, "-c:v"), "libx264");
        assert_eq!(arg_after(&args, "-pix_fmt"), "yuv420p");
        assert_eq!(arg_after(&args, "-r"), "30");
        assert_eq!(arg_after(&args, "-t"), "4.500");
        assert!(args.contains(&"-an".to_string()));
        assert_eq!(args.last().unwrap(), "seg_0.mp4");
    }

    #[tokio::test]
    async fn test_rejects_non_positive_duration() {
        let encoding = EncodingConfig::default();
        let err = render_segment("a.png", 0.0, "/tmp/out.mp4", 30, &encoding, None)
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::RenderFailed { .. }));
        assert!(err.to_string().contains("/tmp/out.mp4"));
    }

    #[tokio::test]
    async fn test_rejects_missing_image() {
        let encoding = EncodingConfig::default();
        let err = render_segment("/nonexistent/a.png", 2.0, "/tmp/out.mp4", 30, &encoding, None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/a.png"));
    }
}
