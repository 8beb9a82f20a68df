//! Audio post-processing: loop a short track into a long ambient mix.
//!
//! The generated track (a few minutes) is low-pass filtered, crossfaded
//! against itself until it covers the target length, trimmed to exactly
//! that length, and faded out. Everything is expressed as a single FFmpeg
//! filter graph so the whole job is one encoder pass.

use std::path::Path;

use rand::Rng;
use tracing::{debug, info};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe::probe_duration;

/// Options for the loop/crossfade pass.
#[derive(Debug, Clone)]
pub struct AudioProcessOptions {
    /// Target length in minutes.
    pub target_minutes: u32,
    /// Uniform random variance applied to the target, in minutes.
    pub variance_minutes: u32,
    /// Low-pass cutoff frequency in Hz.
    pub lowpass_hz: u32,
    /// Crossfade length between loop iterations, in seconds.
    pub crossfade_seconds: u32,
    /// Final fade-out length, in seconds.
    pub fadeout_seconds: u32,
}

impl Default for AudioProcessOptions {
    fn default() -> Self {
        Self {
            target_minutes: 90,
            variance_minutes: 5,
            lowpass_hz: 4000,
            crossfade_seconds: 12,
            fadeout_seconds: 5,
        }
    }
}

/// Pick the run's target length in milliseconds: `target ± variance`
/// minutes, uniformly random.
pub fn pick_target_ms(opts: &AudioProcessOptions, rng: &mut impl Rng) -> u64 {
    let variance = opts.variance_minutes as i64;
    let offset_minutes = rng.random_range(-variance..=variance);
    ((opts.target_minutes as i64 + offset_minutes) * 60_000) as u64
}

/// Number of crossfaded self-appends needed to reach the target length.
///
/// Each append adds `duration - crossfade` of new material, so after `k`
/// appends the chain is `duration + k * (duration - crossfade)` long.
/// Returns the smallest `k` that reaches the target, or an error when the
/// source cannot grow (duration not longer than the crossfade).
pub fn loops_needed(duration_ms: u64, target_ms: u64, crossfade_ms: u64) -> MediaResult<u32> {
    if duration_ms >= target_ms {
        return Ok(0);
    }
    if duration_ms <= crossfade_ms {
        return Err(MediaError::SourceTooShort {
            duration_s: duration_ms as f64 / 1000.0,
            crossfade_s: (crossfade_ms / 1000) as u32,
        });
    }
    let gain = duration_ms - crossfade_ms;
    let deficit = target_ms - duration_ms;
    Ok(deficit.div_ceil(gain) as u32)
}

/// Build the complete filter graph for the loop/crossfade pass.
///
/// With `loops = 0` the source is only filtered, trimmed and faded. With
/// `loops = k` the filtered source is split into `k + 1` copies and
/// chained through `k` crossfades before the trim. The trim is exact:
/// the output duration equals `target_s`.
pub fn build_loop_filter(
    loops: u32,
    lowpass_hz: u32,
    crossfade_s: f64,
    target_s: f64,
    fadeout_s: f64,
) -> String {
    let fade_start = (target_s - fadeout_s).max(0.0);
    let tail = format!(
        "atrim=0:{target_s:.3},afade=t=out:st={fade_start:.3}:d={fadeout_s:.3}[aout]"
    );

    if loops == 0 {
        return format!("[0:a]lowpass=f={lowpass_hz},{tail}");
    }

    let copies = loops + 1;
    let mut graph = format!("[0:a]lowpass=f={lowpass_hz},asplit={copies}");
    for i in 0..copies {
        graph.push_str(&format!("[c{i}]"));
    }
    graph.push(';');

    // Chain: [c0][c1] -> [x1], [x1][c2] -> [x2], ...
    let mut prev = "c0".to_string();
    for i in 1..copies {
        let label = format!("x{i}");
        graph.push_str(&format!(
            "[{prev}][c{i}]acrossfade=d={crossfade_s:.3}[{label}];"
        ));
        prev = label;
    }

    graph.push_str(&format!("[{prev}]{tail}"));
    graph
}

/// Loop, filter and trim `input` into a WAV of the target length.
///
/// Returns the target length in milliseconds that was picked for this run.
pub async fn process_audio(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    opts: &AudioProcessOptions,
) -> MediaResult<u64> {
    let input = input.as_ref();
    let output = output.as_ref();

    let duration_s = probe_duration(input).await?;
    let duration_ms = (duration_s * 1000.0).round() as u64;
    let target_ms = pick_target_ms(opts, &mut rand::rng());
    let crossfade_ms = opts.crossfade_seconds as u64 * 1000;

    let loops = loops_needed(duration_ms, target_ms, crossfade_ms)?;
    info!(
        "Looping {:.1}s source {} times to reach {:.1} minutes",
        duration_s,
        loops,
        target_ms as f64 / 60_000.0
    );

    let filter = build_loop_filter(
        loops,
        opts.lowpass_hz,
        opts.crossfade_seconds as f64,
        target_ms as f64 / 1000.0,
        opts.fadeout_seconds as f64,
    );
    debug!("Audio filter graph: {}", filter);

    let cmd = FfmpegCommand::new(output)
        .input(input)
        .filter_complex(filter)
        .output_args(["-map", "[aout]"])
        .audio_codec("pcm_s16le");

    FfmpegRunner::new().run(&cmd).await?;
    Ok(target_ms)
}
