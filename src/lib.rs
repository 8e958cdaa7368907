//! Sayface: photo-to-cartoon avatars that lip-sync to speech.
//!
//! Avatar creation runs once per photo:
//! Image → face detection → color sampling → avatar rendering → store
//!
//! Speech runs once per utterance:
//! Audio → loudness envelope → visemes → frame compositing → video
//!
//! # Architecture
//!
//! - **Face detection**: Haar-style cascades over integral images
//! - **Avatar**: deterministic 512×512 cartoon drawn with a small rasterizer
//! - **Audio**: decoded via `symphonia`, measured in 50 ms dBFS windows
//! - **Lip-sync**: a procedural mouth overlay, or an external neural tool
//!   when one is installed
//! - **Video**: pure-Rust Y4M, or H.264 MP4 through an `ffmpeg` sidecar

pub mod audio;
pub mod avatar;
pub mod color;
pub mod compositor;
pub mod config;
pub mod error;
pub mod face;
pub mod lipsync;
pub mod pipeline;
pub mod progress;
pub mod raster;
pub mod sayface_dirs;
pub mod video;
pub mod viseme;

pub use audio::{AudioWaveform, EnvelopeFrame, analyze_envelope, decode_audio};
pub use avatar::{Avatar, render_avatar};
pub use config::SayfaceConfig;
pub use error::{Result, SayfaceError};
pub use face::{FaceFeatures, FaceRect, detect_face};
pub use lipsync::{Capabilities, LipSyncProvider, synthesize_video};
pub use pipeline::{Pipeline, SpeakOutcome};
pub use progress::{ProgressCallback, ProgressEvent};
pub use video::VideoArtifact;
pub use viseme::VisemeState;
