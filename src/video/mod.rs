//! Video encoding of composited frames.
//!
//! Frames are written to a hidden temp file in the destination directory and
//! only renamed to their final name once the stream has been finalized. Any
//! failure or cancellation drops the temp file, so a partial video is never
//! left behind.

mod ffmpeg;
mod y4m;

pub use ffmpeg::{FfmpegSink, ffmpeg_available};
pub use y4m::Y4mSink;

use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Duration;

use image::RgbImage;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::{VideoConfig, VideoContainer};
use crate::error::{Result, SayfaceError};

/// Default output frame rate; one frame per 50 ms envelope window.
pub const DEFAULT_FPS: u32 = 20;

/// Concrete file format of an encoded video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Y4m,
    Mp4,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Y4m => "y4m",
            OutputFormat::Mp4 => "mp4",
        }
    }
}

/// A finished video file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoArtifact {
    pub path: PathBuf,
    pub frame_count: u64,
    pub fps: u32,
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
}

impl VideoArtifact {
    /// Playback length, `frame_count / fps`.
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frame_count as f64 / f64::from(self.fps.max(1)))
    }
}

/// Destination for encoded frames.
pub trait FrameSink {
    /// Append one frame. Every frame must have the stream's dimensions.
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()>;

    /// Flush and close the stream.
    fn finish(self: Box<Self>) -> Result<()>;
}

/// Encodes frame sequences at a fixed frame rate.
#[derive(Debug, Clone)]
pub struct VideoEncoder {
    fps: u32,
    container: VideoContainer,
    ffmpeg: String,
}

impl Default for VideoEncoder {
    fn default() -> Self {
        Self::from_config(&VideoConfig::default())
    }
}

impl VideoEncoder {
    pub fn new(fps: u32, container: VideoContainer) -> Self {
        Self {
            fps,
            container,
            ffmpeg: "ffmpeg".to_owned(),
        }
    }

    pub fn from_config(config: &VideoConfig) -> Self {
        Self {
            fps: config.fps,
            container: config.container,
            ffmpeg: config.ffmpeg.clone(),
        }
    }

    /// The format [`Self::encode`] will produce.
    pub fn resolve_format(&self) -> OutputFormat {
        match self.container {
            VideoContainer::Y4m => OutputFormat::Y4m,
            VideoContainer::Mp4 => OutputFormat::Mp4,
            VideoContainer::Auto if ffmpeg_available(&self.ffmpeg) => OutputFormat::Mp4,
            VideoContainer::Auto => OutputFormat::Y4m,
        }
    }

    fn open_sink(
        &self,
        format: OutputFormat,
        path: &Path,
        file: std::fs::File,
        width: u32,
        height: u32,
    ) -> Result<Box<dyn FrameSink>> {
        Ok(match format {
            OutputFormat::Y4m => Box::new(Y4mSink::new(
                BufWriter::new(file),
                width,
                height,
                self.fps,
            )?),
            OutputFormat::Mp4 => Box::new(FfmpegSink::spawn(
                &self.ffmpeg,
                width,
                height,
                self.fps,
                path,
            )?),
        })
    }

    /// Encode `frames` into `dir/<stem>.<ext>`.
    ///
    /// `on_frame` is called with the running frame count after each write.
    /// The token is checked before every frame.
    ///
    /// # Errors
    ///
    /// - [`SayfaceError::EncoderInit`] if there are no frames, the frame size
    ///   is unusable, or the output cannot be opened.
    /// - [`SayfaceError::Encoding`] if a write or the final flush fails.
    /// - [`SayfaceError::Cancelled`] if the token fires mid-stream.
    pub fn encode<I, F>(
        &self,
        frames: I,
        dir: &Path,
        stem: &str,
        cancel: &CancellationToken,
        mut on_frame: F,
    ) -> Result<VideoArtifact>
    where
        I: IntoIterator<Item = RgbImage>,
        F: FnMut(u64),
    {
        if self.fps == 0 {
            return Err(SayfaceError::EncoderInit("frame rate must be > 0".into()));
        }
        let mut frames = frames.into_iter().peekable();
        let (width, height) = frames
            .peek()
            .map(RgbImage::dimensions)
            .ok_or_else(|| SayfaceError::EncoderInit("no frames to encode".into()))?;
        if width == 0 || height == 0 {
            return Err(SayfaceError::EncoderInit(format!(
                "invalid frame size {width}x{height}"
            )));
        }

        let format = self.resolve_format();
        std::fs::create_dir_all(dir).map_err(|e| {
            SayfaceError::EncoderInit(format!("failed to create {}: {e}", dir.display()))
        })?;
        let tmp = tempfile::Builder::new()
            .prefix(".sayface-")
            .suffix(&format!(".{}.part", format.extension()))
            .tempfile_in(dir)
            .map_err(|e| SayfaceError::EncoderInit(format!("failed to create temp file: {e}")))?;
        let file = tmp
            .reopen()
            .map_err(|e| SayfaceError::EncoderInit(format!("failed to open temp file: {e}")))?;
        let mut sink = self.open_sink(format, tmp.path(), file, width, height)?;
        info!(
            ?format,
            width,
            height,
            fps = self.fps,
            "video encoder opened"
        );

        let mut count = 0u64;
        for frame in frames {
            if cancel.is_cancelled() {
                debug!(frames = count, "encoding cancelled, discarding partial output");
                return Err(SayfaceError::Cancelled);
            }
            sink.write_frame(&frame)?;
            count += 1;
            on_frame(count);
        }
        sink.finish()?;

        let path = dir.join(format!("{stem}.{}", format.extension()));
        tmp.persist(&path)
            .map_err(|e| SayfaceError::Encoding(format!("failed to persist video: {e}")))?;

        info!(path = %path.display(), frames = count, "video written");
        Ok(VideoArtifact {
            path,
            frame_count: count,
            fps: self.fps,
            width,
            height,
            format,
        })
    }
}
