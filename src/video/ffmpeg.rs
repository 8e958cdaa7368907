//! H.264 MP4 output through an ffmpeg sidecar process.
//!
//! Raw RGB frames are piped to ffmpeg's stdin. The child is killed and
//! reaped if the sink is dropped before [`FrameSink::finish`].

use std::io::{ErrorKind, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};

use image::RgbImage;
use tracing::{debug, warn};

use super::FrameSink;
use crate::error::{Result, SayfaceError};

/// Whether `program` resolves to an executable on PATH (or is a path to one).
pub fn ffmpeg_available(program: &str) -> bool {
    which::which(program).is_ok()
}

pub struct FfmpegSink {
    child: Child,
    stdin: Option<ChildStdin>,
    width: u32,
    height: u32,
}

impl FfmpegSink {
    /// Spawn ffmpeg writing an MP4 to `output_path`.
    ///
    /// # Errors
    ///
    /// Returns [`SayfaceError::EncoderInit`] if ffmpeg is missing or cannot
    /// be started, or if the dimensions are not even.
    pub fn spawn(
        program: &str,
        width: u32,
        height: u32,
        fps: u32,
        output_path: &Path,
    ) -> Result<Self> {
        if width % 2 != 0 || height % 2 != 0 {
            return Err(SayfaceError::EncoderInit(format!(
                "yuv420p needs even dimensions, got {width}x{height}"
            )));
        }

        let mut command = Command::new(program);
        command
            .arg("-hide_banner")
            .arg("-loglevel")
            .arg("error")
            .arg("-y")
            .arg("-f")
            .arg("rawvideo")
            .arg("-pix_fmt")
            .arg("rgb24")
            .arg("-s:v")
            .arg(format!("{width}x{height}"))
            .arg("-r")
            .arg(fps.to_string())
            .arg("-i")
            .arg("-")
            .arg("-an")
            .arg("-c:v")
            .arg("libx264")
            .arg("-pix_fmt")
            .arg("yuv420p")
            .arg("-movflags")
            .arg("+faststart")
            .arg("-f")
            .arg("mp4")
            .arg(output_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit());

        let mut child = command.spawn().map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                SayfaceError::EncoderInit(format!("{program} was not found on PATH"))
            } else {
                SayfaceError::EncoderInit(format!("failed to spawn {program}: {e}"))
            }
        })?;

        let stdin = match child.stdin.take() {
            Some(s) => s,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(SayfaceError::EncoderInit(
                    "failed to capture ffmpeg stdin".into(),
                ));
            }
        };
        debug!(pid = child.id(), width, height, fps, "ffmpeg sidecar started");

        Ok(Self {
            child,
            stdin: Some(stdin),
            width,
            height,
        })
    }
}

impl FrameSink for FfmpegSink {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        if frame.dimensions() != (self.width, self.height) {
            return Err(SayfaceError::Encoding(format!(
                "frame is {:?}, stream is {}x{}",
                frame.dimensions(),
                self.width,
                self.height
            )));
        }
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| SayfaceError::Encoding("ffmpeg stdin already closed".into()))?;
        stdin
            .write_all(frame.as_raw())
            .map_err(|e| SayfaceError::Encoding(format!("failed to write frame to ffmpeg: {e}")))
    }

    fn finish(mut self: Box<Self>) -> Result<()> {
        if let Some(mut stdin) = self.stdin.take() {
            stdin
                .flush()
                .map_err(|e| SayfaceError::Encoding(format!("failed to flush ffmpeg stdin: {e}")))?;
        }
        let status = self
            .child
            .wait()
            .map_err(|e| SayfaceError::Encoding(format!("failed waiting for ffmpeg: {e}")))?;
        if !status.success() {
            return Err(SayfaceError::Encoding(format!(
                "ffmpeg failed with status {status}"
            )));
        }
        Ok(())
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        // Nothing to do once `finish` has reaped the child.
        if let Ok(Some(_)) = self.child.try_wait() {
            return;
        }
        drop(self.stdin.take());
        if let Err(e) = self.child.kill() {
            warn!("failed to kill ffmpeg sidecar: {e}");
        }
        let _ = self.child.wait();
    }
}
