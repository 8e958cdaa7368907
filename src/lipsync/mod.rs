//! Lip-sync video synthesis.
//!
//! A [`LipSyncProvider`] turns an avatar plus speech audio into a video. The
//! procedural provider is always available; the neural provider wraps an
//! external tool and is only offered when its files exist on disk. The
//! choice is made once per request by [`select_provider`].

mod neural;
mod procedural;

pub use neural::NeuralProvider;
pub use procedural::ProceduralProvider;

use std::path::Path;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::audio::{AudioWaveform, EnvelopeFrame};
use crate::avatar::Avatar;
use crate::config::{SayfaceConfig, VideoContainer};
use crate::error::Result;
use crate::progress::ProgressCallback;
use crate::video::{VideoArtifact, VideoEncoder, ffmpeg_available};

/// Everything a provider needs for one video.
pub struct LipSyncRequest<'a> {
    pub avatar: &'a Avatar,
    pub audio: &'a AudioWaveform,
    /// Directory the finished video is written to.
    pub output_dir: &'a Path,
    /// File name of the video without extension.
    pub stem: &'a str,
    pub cancel: &'a CancellationToken,
    pub progress: Option<&'a ProgressCallback>,
}

/// A strategy for producing a lip-sync video.
pub trait LipSyncProvider: Send + Sync {
    /// Short identifier used in logs and reports.
    fn name(&self) -> &'static str;

    /// Whether the provider can run on this machine right now.
    fn is_available(&self) -> bool;

    /// Produce a video for the request.
    ///
    /// # Errors
    ///
    /// Returns an error if decoding, encoding or an external tool fails.
    /// No partial output is left in `output_dir` on error.
    fn synthesize(&self, request: &LipSyncRequest<'_>) -> Result<VideoArtifact>;
}

/// First available provider in preference order.
pub fn select_provider<'a>(
    candidates: &[&'a dyn LipSyncProvider],
) -> Option<&'a dyn LipSyncProvider> {
    candidates.iter().copied().find(|p| p.is_available())
}

/// Optional features present on this machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub custom_avatars: bool,
    pub neural_lipsync: bool,
    pub mp4_encoding: bool,
    pub procedural_lipsync: bool,
}

impl Capabilities {
    pub fn detect(config: &SayfaceConfig) -> Self {
        Self {
            custom_avatars: true,
            neural_lipsync: NeuralProvider::from_config(config).is_available(),
            mp4_encoding: ffmpeg_available(&config.video.ffmpeg),
            procedural_lipsync: true,
        }
    }
}

/// Render a silent lip-sync video from a precomputed loudness envelope.
///
/// Each envelope window becomes one frame at `fps`. The container follows
/// [`VideoContainer::Auto`].
///
/// # Errors
///
/// Returns an error if the envelope is empty, encoding fails or `cancel`
/// fires. No partial output is left in `output_dir` on error.
pub fn synthesize_video(
    avatar: &Avatar,
    envelope: &[EnvelopeFrame],
    fps: u32,
    output_dir: &Path,
    stem: &str,
    cancel: &CancellationToken,
) -> Result<VideoArtifact> {
    let encoder = VideoEncoder::new(fps, VideoContainer::Auto);
    procedural::render_envelope(avatar, envelope, &encoder, output_dir, stem, cancel, None)
}
