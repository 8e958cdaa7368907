//! Audio file decoding via symphonia (mp3, aac/m4a, wav).

use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

use super::AudioWaveform;
use crate::error::{Result, SayfaceError};

fn decode_err(msg: impl std::fmt::Display) -> SayfaceError {
    SayfaceError::AudioDecode(msg.to_string())
}

/// Decode an audio file into interleaved `f32` samples.
///
/// # Errors
///
/// Returns [`SayfaceError::AudioDecode`] if the file cannot be opened, has no
/// audio track, or uses an unsupported codec.
pub fn decode_audio(path: &Path) -> Result<AudioWaveform> {
    let file = std::fs::File::open(path)
        .map_err(|e| decode_err(format!("failed to open {}: {e}", path.display())))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| decode_err(format!("failed to probe audio: {e}")))?;

    let mut format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| decode_err("no default audio track"))?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let sample_rate = codec_params
        .sample_rate
        .ok_or_else(|| decode_err("unknown sample rate"))?;
    let mut channels = codec_params.channels.map(|c| c.count());

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| decode_err(format!("failed to create decoder: {e}")))?;

    let mut out: Vec<f32> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(decode_err(format!("audio read error: {e}"))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphError::DecodeError(_)) => continue,
            Err(e) => return Err(decode_err(format!("audio decode error: {e}"))),
        };

        let spec = *decoded.spec();
        channels.get_or_insert(spec.channels.count());
        let required = decoded.frames().saturating_mul(spec.channels.count());
        match sample_buf.as_mut() {
            Some(b) if b.capacity() >= required => b.clear(),
            _ => sample_buf = Some(SampleBuffer::<f32>::new(decoded.capacity() as u64, spec)),
        }

        if let Some(b) = sample_buf.as_mut() {
            b.copy_interleaved_ref(decoded);
            out.extend_from_slice(b.samples());
        }
    }

    let channels = channels.unwrap_or(1);
    let channels = u16::try_from(channels)
        .map_err(|_| decode_err(format!("unsupported channel count {channels}")))?;
    debug!(
        path = %path.display(),
        sample_rate,
        channels,
        samples = out.len(),
        "audio decoded"
    );
    AudioWaveform::new(out, channels, sample_rate)
}
