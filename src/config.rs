//! Configuration types for avatar creation and lip-sync synthesis.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Result, SayfaceError};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SayfaceConfig {
    /// Face and eye detection settings.
    pub detector: DetectorConfig,
    /// Loudness envelope settings.
    pub envelope: EnvelopeConfig,
    /// Video output settings.
    pub video: VideoConfig,
    /// Optional external neural lip-sync tool.
    pub neural: NeuralConfig,
    /// Where avatars and videos are written.
    pub storage: StorageConfig,
}

/// Face detector configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Window growth per scale step.
    pub scale_factor: f32,
    /// A face group needs more than this many raw hits.
    pub face_min_neighbors: usize,
    /// An eye group needs more than this many raw hits.
    ///
    /// Higher than the face threshold: a false eye inside a known face is
    /// worse than a missed one.
    pub eye_min_neighbors: usize,
    /// Smallest face window side in pixels.
    pub min_face_size: u32,
    /// Relative tolerance for merging raw hits.
    pub group_eps: f32,
    /// JSON cascade replacing the built-in face template.
    pub face_cascade: Option<PathBuf>,
    /// JSON cascade replacing the built-in eye template.
    pub eye_cascade: Option<PathBuf>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            scale_factor: 1.1,
            face_min_neighbors: 5,
            eye_min_neighbors: 10,
            min_face_size: 30,
            group_eps: 0.2,
            face_cascade: None,
            eye_cascade: None,
        }
    }
}

/// Loudness envelope configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeConfig {
    /// Window length in milliseconds; one video frame per window.
    pub frame_duration_ms: u32,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            frame_duration_ms: crate::audio::DEFAULT_FRAME_DURATION_MS,
        }
    }
}

/// Output container for the procedural video.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoContainer {
    /// MP4 when ffmpeg is available, otherwise Y4M.
    #[default]
    Auto,
    /// Uncompressed YUV4MPEG2, written without external tools.
    Y4m,
    /// H.264 MP4 via an ffmpeg sidecar process.
    Mp4,
}

/// Video encoder configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Output frame rate.
    pub fps: u32,
    /// Output container.
    pub container: VideoContainer,
    /// ffmpeg executable name or path.
    pub ffmpeg: String,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            fps: crate::video::DEFAULT_FPS,
            container: VideoContainer::Auto,
            ffmpeg: "ffmpeg".to_owned(),
        }
    }
}

/// External neural lip-sync tool (a Wav2Lip-style `inference.py`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NeuralConfig {
    /// Whether the neural tool may be used when present.
    pub enabled: bool,
    /// Checkout directory containing `inference.py`.
    pub repo_dir: PathBuf,
    /// Model checkpoint file.
    pub checkpoint: PathBuf,
    /// Python interpreter name or path.
    pub python: String,
    /// Frame rate passed to the tool.
    pub fps: u32,
    /// Kill the tool after this many seconds.
    pub timeout_secs: u64,
}

impl Default for NeuralConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            repo_dir: PathBuf::from("Wav2Lip"),
            checkpoint: PathBuf::from("Wav2Lip/checkpoints/wav2lip_gan.pth"),
            python: "python".to_owned(),
            fps: 25,
            timeout_secs: 60,
        }
    }
}

/// Output locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Avatar PNG + face metadata directory.
    pub avatar_dir: PathBuf,
    /// Lip-sync video directory.
    pub video_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            avatar_dir: crate::sayface_dirs::avatars_dir(),
            video_dir: crate::sayface_dirs::videos_dir(),
        }
    }
}

impl SayfaceConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&content).map_err(|e| SayfaceError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| SayfaceError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> PathBuf {
        crate::sayface_dirs::config_file()
    }

    /// Reject values the pipeline cannot run with.
    ///
    /// # Errors
    ///
    /// Returns a config error naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.envelope.frame_duration_ms == 0 {
            return Err(SayfaceError::Config(
                "envelope.frame_duration_ms must be > 0".into(),
            ));
        }
        if self.video.fps == 0 {
            return Err(SayfaceError::Config("video.fps must be > 0".into()));
        }
        let scale = self.detector.scale_factor;
        if scale.is_nan() || scale <= 1.0 {
            return Err(SayfaceError::Config(
                "detector.scale_factor must be > 1.0".into(),
            ));
        }
        Ok(())
    }
}
