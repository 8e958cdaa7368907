//! Short-term loudness per fixed-length window.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::AudioWaveform;
use crate::error::{Result, SayfaceError};

/// Loudness of one analysis window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeFrame {
    /// Window start relative to the beginning of the audio.
    pub offset_ms: u64,
    /// RMS level in dB relative to full scale; `-inf` for silence or an
    /// empty window.
    pub loudness_dbfs: f64,
}

/// RMS level of `samples` in dBFS.
pub fn dbfs(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return f64::NEG_INFINITY;
    }
    let sum_sq: f64 = samples.iter().map(|&s| f64::from(s) * f64::from(s)).sum();
    let rms = (sum_sq / samples.len() as f64).sqrt();
    if rms > 0.0 {
        20.0 * rms.log10()
    } else {
        f64::NEG_INFINITY
    }
}

/// Split the waveform into `frame_duration_ms` windows and measure each.
///
/// Produces `ceil(duration_ms / frame_duration_ms)` frames; the last window
/// may be shorter than the others.
///
/// # Errors
///
/// Returns a config error if `frame_duration_ms` is zero.
pub fn analyze_envelope(
    waveform: &AudioWaveform,
    frame_duration_ms: u32,
) -> Result<Vec<EnvelopeFrame>> {
    if frame_duration_ms == 0 {
        return Err(SayfaceError::Config(
            "frame duration must be greater than zero".into(),
        ));
    }
    let step = u64::from(frame_duration_ms);
    let sr = u64::from(waveform.sample_rate());
    let channels = usize::from(waveform.channels());
    let total = waveform.frames();
    let count = waveform.duration_ms().div_ceil(step);

    let frames: Vec<EnvelopeFrame> = (0..count)
        .map(|i| {
            let offset_ms = i * step;
            let start = (offset_ms * sr / 1000).min(total);
            let end = ((offset_ms + step) * sr / 1000).min(total);
            let window = &waveform.samples()[start as usize * channels..end as usize * channels];
            EnvelopeFrame {
                offset_ms,
                loudness_dbfs: dbfs(window),
            }
        })
        .collect();

    debug!(
        windows = frames.len(),
        frame_duration_ms,
        duration_ms = waveform.duration_ms(),
        "loudness envelope computed"
    );
    Ok(frames)
}
