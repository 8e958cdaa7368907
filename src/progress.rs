//! Progress event types for avatar creation and lip-sync synthesis.
//!
//! Provides callback-based progress reporting that decouples the pipeline
//! from presentation (CLI log lines, a server pushing status updates).

use std::fmt;

/// A pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Decoding the uploaded photo.
    DecodeImage,
    /// Face and eye detection.
    DetectFace,
    /// Color sampling and avatar drawing.
    RenderAvatar,
    /// Writing the avatar PNG and metadata.
    StoreAvatar,
    /// Decoding the speech audio.
    DecodeAudio,
    /// Running a lip-sync provider.
    LipSync,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::DecodeImage => "decode image",
            Stage::DetectFace => "detect face",
            Stage::RenderAvatar => "render avatar",
            Stage::StoreAvatar => "store avatar",
            Stage::DecodeAudio => "decode audio",
            Stage::LipSync => "lip sync",
        };
        f.write_str(label)
    }
}

/// Progress events emitted by the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// A stage has started.
    StageStarted {
        stage: Stage,
    },

    /// A stage completed successfully.
    StageFinished {
        stage: Stage,
        /// Wall time spent in the stage, in seconds.
        duration_secs: f64,
    },

    /// A lip-sync provider was chosen for this request.
    ProviderSelected {
        /// Provider name (e.g. `"procedural"`).
        name: &'static str,
    },

    /// One more video frame was written.
    FrameEncoded {
        /// Frames written so far.
        frame: u64,
        /// Frames expected in total.
        total: u64,
    },

    /// A stage failed; the pipeline may continue in a degraded mode.
    Error {
        stage: Stage,
        /// Human-readable error description.
        message: String,
    },
}

/// Callback type for receiving progress events.
pub type ProgressCallback = Box<dyn Fn(ProgressEvent) + Send + Sync>;
