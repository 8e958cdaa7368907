//! Speech audio decoding and loudness envelope analysis.

mod decode;
mod envelope;

pub use decode::decode_audio;
pub use envelope::{EnvelopeFrame, analyze_envelope};

use std::path::Path;

use crate::error::{Result, SayfaceError};

/// Default envelope window length; one video frame per window.
pub const DEFAULT_FRAME_DURATION_MS: u32 = 50;

/// Decoded PCM audio.
///
/// Samples are interleaved `f32` in `[-1, 1]`; a frame is one sample per
/// channel.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioWaveform {
    samples: Vec<f32>,
    channels: u16,
    sample_rate: u32,
}

impl AudioWaveform {
    /// Wrap interleaved samples.
    ///
    /// # Errors
    ///
    /// Returns an error if `channels` or `sample_rate` is zero.
    pub fn new(samples: Vec<f32>, channels: u16, sample_rate: u32) -> Result<Self> {
        if channels == 0 || sample_rate == 0 {
            return Err(SayfaceError::AudioDecode(format!(
                "invalid audio format: {channels} channels at {sample_rate} Hz"
            )));
        }
        Ok(Self {
            samples,
            channels,
            sample_rate,
        })
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of complete frames.
    pub fn frames(&self) -> u64 {
        (self.samples.len() / usize::from(self.channels)) as u64
    }

    /// Duration rounded to the nearest millisecond.
    pub fn duration_ms(&self) -> u64 {
        let sr = u64::from(self.sample_rate);
        (self.frames() * 1000 + sr / 2) / sr
    }

    /// Write the waveform as 16-bit PCM WAV.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    pub fn write_wav(&self, path: &Path) -> Result<()> {
        let spec = hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec)
            .map_err(|e| SayfaceError::Encoding(format!("failed to create wav writer: {e}")))?;
        for &s in &self.samples {
            let v = (s.clamp(-1.0, 1.0) * f32::from(i16::MAX)).round() as i16;
            writer
                .write_sample(v)
                .map_err(|e| SayfaceError::Encoding(format!("failed to write wav sample: {e}")))?;
        }
        writer
            .finalize()
            .map_err(|e| SayfaceError::Encoding(format!("failed to finalize wav: {e}")))?;
        Ok(())
    }
}
