//! Still-image video rendering with a slow Ken Burns effect.

use std::path::Path;

use tracing::{debug, info};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;

/// Output width in pixels.
pub const RENDER_WIDTH: u32 = 1920;
/// Output height in pixels.
pub const RENDER_HEIGHT: u32 = 1080;
/// Output frame rate.
pub const RENDER_FPS: u32 = 25;

/// Build the Ken Burns pan/zoom filter for a static background.
///
/// The image is scaled up 10% for panning room, then `zoompan` drifts from
/// 1.0 to at most 1.03 zoom with a gentle horizontal sway and a very slow
/// downward pan. Motion is tuned for a roughly 90-minute runtime at 25 fps.
pub fn build_ken_burns_filter(width: u32, height: u32) -> String {
    format!(
        "scale={sw}:{sh}:force_original_aspect_ratio=increase,\
         zoompan=\
         z='min(1+0.0003*on/{fps},1.03)':\
         x='iw/2-(iw/zoom/2)+sin(on/{fps}/100)*20':\
         y='ih/2-(ih/zoom/2)+on/{fps}/100*0.5':\
         d=1:\
         s={width}x{height}:\
         fps={fps}",
        sw = width * 11 / 10,
        sh = height * 11 / 10,
        fps = RENDER_FPS,
    )
}

/// Render a static image plus an audio file into a video.
///
/// The output length matches the audio (`-shortest`); the still image is
/// looped for the full duration with the pan/zoom filter applied.
pub async fn render_video(
    background: impl AsRef<Path>,
    audio: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> MediaResult<()> {
    let background = background.as_ref();
    let audio = audio.as_ref();
    let output = output.as_ref();

    info!(
        "Rendering {} + {} -> {}",
        background.display(),
        audio.display(),
        output.display()
    );

    let cmd = FfmpegCommand::new(output)
        .input_with_args(["-loop", "1"], background)
        .input(audio)
        .video_filter(build_ken_burns_filter(RENDER_WIDTH, RENDER_HEIGHT))
        .video_codec("libx264")
        .preset("medium")
        .audio_codec("aac")
        .audio_bitrate("192k")
        .output_args(["-pix_fmt", "yuv420p"])
        .output_arg("-shortest");

    FfmpegRunner::new()
        .run_with_progress(&cmd, |progress| {
            debug!(
                "Render progress: {:.1} min encoded ({}x)",
                progress.out_time_ms as f64 / 60_000.0,
                progress.speed
            );
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ken_burns_filter_dimensions() {
        let filter = build_ken_burns_filter(1920, 1080);
        assert!(filter.contains("scale=2112:1188"));
        assert!(filter.contains("s=1920x1080"));
        assert!(filter.contains("fps=25"));
        // Zoom is capped so the drift stays subtle.
        assert!(filter.contains("1.03"));
    }
}
