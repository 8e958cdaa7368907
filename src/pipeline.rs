//! Request-level orchestration.
//!
//! [`Pipeline::create_avatar`] runs once per uploaded photo and fails hard
//! when no face is found. [`Pipeline::speak`] runs once per utterance and
//! degrades instead: if no video can be produced the caller still gets an
//! outcome, just without a video, and can fall back to playing the audio.

use std::path::{Path, PathBuf};
use std::time::Instant;

use image::RgbImage;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::audio::{AudioWaveform, decode_audio};
use crate::avatar::store::{AvatarStore, StoredAvatar};
use crate::avatar::{Avatar, render_avatar};
use crate::config::SayfaceConfig;
use crate::error::{Result, SayfaceError};
use crate::face::{FaceDetector, FaceFeatures};
use crate::lipsync::{
    LipSyncProvider, LipSyncRequest, NeuralProvider, ProceduralProvider, select_provider,
};
use crate::progress::{ProgressCallback, ProgressEvent, Stage};
use crate::video::VideoArtifact;

/// A newly created and stored avatar.
#[derive(Debug, Clone)]
pub struct CreatedAvatar {
    pub stored: StoredAvatar,
    pub avatar: Avatar,
    pub features: FaceFeatures,
}

/// Result of a speech request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeakOutcome {
    /// The lip-sync video, if one could be produced.
    pub video: Option<VideoArtifact>,
    /// Name of the provider that produced the video.
    pub provider: Option<&'static str>,
    /// Why no video (or only a fallback video) was produced.
    pub error: Option<String>,
}

impl SpeakOutcome {
    fn audio_only(error: &SayfaceError) -> Self {
        Self {
            video: None,
            provider: None,
            error: Some(error.to_string()),
        }
    }
}

/// Avatar creation and lip-sync pipeline.
///
/// Holds no per-request state, so one instance can serve concurrent
/// requests from several threads.
pub struct Pipeline {
    config: SayfaceConfig,
    detector: FaceDetector,
    store: AvatarStore,
    neural: NeuralProvider,
    procedural: ProceduralProvider,
    progress: Option<ProgressCallback>,
}

impl Pipeline {
    /// Build a pipeline from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid or a configured cascade
    /// file cannot be loaded.
    pub fn new(config: SayfaceConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            detector: FaceDetector::from_config(&config.detector)?,
            store: AvatarStore::new(&config.storage.avatar_dir),
            neural: NeuralProvider::from_config(&config),
            procedural: ProceduralProvider::from_config(&config),
            config,
            progress: None,
        })
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(cb) = &self.progress {
            cb(event);
        }
    }

    fn stage<T>(&self, stage: Stage, f: impl FnOnce() -> Result<T>) -> Result<T> {
        self.emit(ProgressEvent::StageStarted { stage });
        let start = Instant::now();
        let result = f();
        match &result {
            Ok(_) => self.emit(ProgressEvent::StageFinished {
                stage,
                duration_secs: start.elapsed().as_secs_f64(),
            }),
            Err(e) => self.emit(ProgressEvent::Error {
                stage,
                message: e.to_string(),
            }),
        }
        result
    }

    /// Detect, render and store an avatar from encoded image bytes.
    ///
    /// # Errors
    ///
    /// - [`SayfaceError::InvalidImageData`] if the bytes are not an image.
    /// - [`SayfaceError::FaceNotDetected`] if no face is found; nothing is
    ///   rendered or stored in that case.
    /// - Store or I/O errors if the avatar cannot be written.
    pub fn create_avatar(&self, image_bytes: &[u8]) -> Result<CreatedAvatar> {
        let image = self.stage(Stage::DecodeImage, || decode_image(image_bytes))?;
        self.create_avatar_from_image(&image)
    }

    /// Same as [`Self::create_avatar`] for an already decoded image.
    ///
    /// # Errors
    ///
    /// See [`Self::create_avatar`].
    pub fn create_avatar_from_image(&self, image: &RgbImage) -> Result<CreatedAvatar> {
        let features = self.stage(Stage::DetectFace, || {
            self.detector
                .detect(image)
                .ok_or(SayfaceError::FaceNotDetected)
        })?;
        let avatar = self.stage(Stage::RenderAvatar, || Ok(render_avatar(image, &features)))?;
        let stored = self.stage(Stage::StoreAvatar, || self.store.save(&avatar))?;
        info!(id = %stored.id, "avatar created");
        Ok(CreatedAvatar {
            stored,
            avatar,
            features,
        })
    }

    /// Produce a lip-sync video for a stored avatar and an audio file.
    ///
    /// # Errors
    ///
    /// Fails only if the avatar cannot be loaded or the request is
    /// cancelled. Audio and encoding problems are reported through
    /// [`SpeakOutcome::error`].
    pub fn speak(
        &self,
        avatar_id: &str,
        audio_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<SpeakOutcome> {
        let avatar = self.store.load(avatar_id)?;
        let audio = match self.stage(Stage::DecodeAudio, || decode_audio(audio_path)) {
            Ok(a) => a,
            Err(e) => {
                warn!("audio decode failed, returning audio-only outcome: {e}");
                return Ok(SpeakOutcome::audio_only(&e));
            }
        };
        self.speak_with(&avatar, &audio, cancel)
    }

    /// Produce a lip-sync video for an in-memory avatar and waveform.
    ///
    /// # Errors
    ///
    /// Returns [`SayfaceError::Cancelled`] if the token fires; other
    /// failures are reported through [`SpeakOutcome::error`].
    pub fn speak_with(
        &self,
        avatar: &Avatar,
        audio: &AudioWaveform,
        cancel: &CancellationToken,
    ) -> Result<SpeakOutcome> {
        let output_dir = self.video_dir();
        let stem = Uuid::new_v4().to_string();
        let request = LipSyncRequest {
            avatar,
            audio,
            output_dir: &output_dir,
            stem: &stem,
            cancel,
            progress: self.progress.as_ref(),
        };

        let candidates: [&dyn LipSyncProvider; 2] = [&self.neural, &self.procedural];
        let Some(provider) = select_provider(&candidates) else {
            return Ok(SpeakOutcome::audio_only(&SayfaceError::NeuralProvider(
                "no lip-sync provider available".into(),
            )));
        };
        self.emit(ProgressEvent::ProviderSelected {
            name: provider.name(),
        });
        info!(provider = provider.name(), "lip-sync provider selected");

        let mut first_error = None;
        let mut attempt = self.run_provider(provider, &request);
        if let Err(e) = &attempt
            && provider.name() != self.procedural.name()
            && !matches!(e, SayfaceError::Cancelled)
        {
            warn!("{} lip-sync failed, falling back to procedural: {e}", provider.name());
            first_error = Some(e.to_string());
            self.emit(ProgressEvent::ProviderSelected {
                name: self.procedural.name(),
            });
            attempt = self.run_provider(&self.procedural, &request);
        }

        match attempt {
            Ok((video, name)) => Ok(SpeakOutcome {
                video: Some(video),
                provider: Some(name),
                error: first_error,
            }),
            Err(SayfaceError::Cancelled) => Err(SayfaceError::Cancelled),
            Err(e) => {
                warn!("lip-sync failed, returning audio-only outcome: {e}");
                Ok(SpeakOutcome::audio_only(&e))
            }
        }
    }

    fn run_provider(
        &self,
        provider: &dyn LipSyncProvider,
        request: &LipSyncRequest<'_>,
    ) -> Result<(VideoArtifact, &'static str)> {
        self.stage(Stage::LipSync, || provider.synthesize(request))
            .map(|video| (video, provider.name()))
    }

    fn video_dir(&self) -> PathBuf {
        self.config.storage.video_dir.clone()
    }
}

/// Decode an uploaded image into RGB8, dropping any alpha channel.
///
/// # Errors
///
/// Returns [`SayfaceError::InvalidImageData`] if the format is unsupported
/// or the data is corrupt.
pub fn decode_image(bytes: &[u8]) -> Result<RgbImage> {
    image::load_from_memory(bytes)
        .map(|img| img.to_rgb8())
        .map_err(|e| SayfaceError::InvalidImageData(e.to_string()))
}
