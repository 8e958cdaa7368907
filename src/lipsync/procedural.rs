//! Loudness-driven mouth animation on the avatar canvas.

use std::path::Path;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{LipSyncProvider, LipSyncRequest};
use crate::audio::{EnvelopeFrame, analyze_envelope};
use crate::avatar::Avatar;
use crate::compositor::FrameCompositor;
use crate::config::SayfaceConfig;
use crate::error::Result;
use crate::progress::{ProgressCallback, ProgressEvent};
use crate::video::{VideoArtifact, VideoEncoder};
use crate::viseme::map_envelope;

/// Envelope → visemes → composited frames → encoder.
///
/// The output is silent; audio muxing is left to the caller.
#[derive(Debug, Clone)]
pub struct ProceduralProvider {
    frame_duration_ms: u32,
    encoder: VideoEncoder,
}

impl ProceduralProvider {
    pub fn new(frame_duration_ms: u32, encoder: VideoEncoder) -> Self {
        Self {
            frame_duration_ms,
            encoder,
        }
    }

    pub fn from_config(config: &SayfaceConfig) -> Self {
        Self::new(
            config.envelope.frame_duration_ms,
            VideoEncoder::from_config(&config.video),
        )
    }
}

impl LipSyncProvider for ProceduralProvider {
    fn name(&self) -> &'static str {
        "procedural"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn synthesize(&self, request: &LipSyncRequest<'_>) -> Result<VideoArtifact> {
        let envelope = analyze_envelope(request.audio, self.frame_duration_ms)?;
        render_envelope(
            request.avatar,
            &envelope,
            &self.encoder,
            request.output_dir,
            request.stem,
            request.cancel,
            request.progress,
        )
    }
}

/// One frame per envelope window, encoded in order.
pub(super) fn render_envelope(
    avatar: &Avatar,
    envelope: &[EnvelopeFrame],
    encoder: &VideoEncoder,
    output_dir: &Path,
    stem: &str,
    cancel: &CancellationToken,
    progress: Option<&ProgressCallback>,
) -> Result<VideoArtifact> {
    let states = map_envelope(envelope);
    let total = states.len() as u64;
    debug!(frames = total, "viseme track ready");

    let frames = FrameCompositor::new(avatar).frames(states);
    let artifact = encoder.encode(frames, output_dir, stem, cancel, |frame| {
        if let Some(cb) = progress {
            cb(ProgressEvent::FrameEncoded { frame, total });
        }
    })?;
    info!(
        path = %artifact.path.display(),
        frames = artifact.frame_count,
        "procedural lip-sync finished"
    );
    Ok(artifact)
}
