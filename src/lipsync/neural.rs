//! External neural lip-sync tool (a Wav2Lip-style `inference.py`).
//!
//! The tool is run as a child process on a face image and a WAV file, both
//! staged in a scratch directory. It is killed when the timeout elapses or
//! the request is cancelled.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::{LipSyncProvider, LipSyncRequest};
use crate::config::{NeuralConfig, SayfaceConfig};
use crate::error::{Result, SayfaceError};
use crate::video::{OutputFormat, VideoArtifact};

const POLL_INTERVAL: Duration = Duration::from_millis(50);
/// Bytes of the tool's stderr kept for error messages.
const STDERR_TAIL: usize = 2000;

#[derive(Debug, Clone)]
pub struct NeuralProvider {
    config: NeuralConfig,
}

impl NeuralProvider {
    pub fn new(config: NeuralConfig) -> Self {
        Self { config }
    }

    pub fn from_config(config: &SayfaceConfig) -> Self {
        Self::new(config.neural.clone())
    }

    fn script(&self) -> PathBuf {
        self.config.repo_dir.join("inference.py")
    }

    fn command(&self, face: &Path, audio: &Path, outfile: &Path) -> Command {
        let mut cmd = Command::new(&self.config.python);
        cmd.arg(self.script())
            .arg("--checkpoint_path")
            .arg(&self.config.checkpoint)
            .arg("--face")
            .arg(face)
            .arg("--audio")
            .arg(audio)
            .arg("--outfile")
            .arg(outfile)
            .arg("--resize_factor")
            .arg("1")
            .arg("--fps")
            .arg(self.config.fps.to_string());
        cmd
    }

    /// Run the tool to completion, killing it on timeout or cancellation.
    fn run(
        &self,
        mut cmd: Command,
        stderr_path: &Path,
        request: &LipSyncRequest<'_>,
    ) -> Result<()> {
        let stderr = std::fs::File::create(stderr_path)?;
        let mut child = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(stderr))
            .spawn()
            .map_err(|e| {
                SayfaceError::NeuralProvider(format!(
                    "failed to spawn {}: {e}",
                    self.config.python
                ))
            })?;

        let timeout = Duration::from_secs(self.config.timeout_secs);
        let start = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) if status.success() => return Ok(()),
                Ok(Some(status)) => {
                    let tail = read_tail(stderr_path);
                    return Err(SayfaceError::NeuralProvider(format!(
                        "inference exited with {status}: {tail}"
                    )));
                }
                Ok(None) => {
                    let cancelled = request.cancel.is_cancelled();
                    if cancelled || start.elapsed() > timeout {
                        let _ = child.kill();
                        let _ = child.wait();
                        if cancelled {
                            return Err(SayfaceError::Cancelled);
                        }
                        return Err(SayfaceError::NeuralProvider(format!(
                            "inference timed out after {}s",
                            self.config.timeout_secs
                        )));
                    }
                    std::thread::sleep(POLL_INTERVAL);
                }
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(SayfaceError::NeuralProvider(format!(
                        "failed to check inference status: {e}"
                    )));
                }
            }
        }
    }
}

fn read_tail(path: &Path) -> String {
    let text = std::fs::read_to_string(path).unwrap_or_default();
    let trimmed = text.trim();
    let mut start = trimmed.len().saturating_sub(STDERR_TAIL);
    while !trimmed.is_char_boundary(start) {
        start += 1;
    }
    trimmed[start..].to_owned()
}

impl LipSyncProvider for NeuralProvider {
    fn name(&self) -> &'static str {
        "neural"
    }

    fn is_available(&self) -> bool {
        self.config.enabled && self.config.repo_dir.is_dir() && self.config.checkpoint.is_file()
    }

    fn synthesize(&self, request: &LipSyncRequest<'_>) -> Result<VideoArtifact> {
        let scratch = tempfile::tempdir()?;
        let face_path = scratch.path().join("face.png");
        let audio_path = scratch.path().join("speech.wav");
        request
            .avatar
            .canvas
            .save_with_format(&face_path, image::ImageFormat::Png)
            .map_err(|e| SayfaceError::NeuralProvider(format!("failed to stage face image: {e}")))?;
        request.audio.write_wav(&audio_path)?;

        std::fs::create_dir_all(request.output_dir)?;
        // The tool picks its muxer from the extension, so it must stay last.
        let out = tempfile::Builder::new()
            .prefix(".sayface-")
            .suffix(".part.mp4")
            .tempfile_in(request.output_dir)?;

        let cmd = self.command(&face_path, &audio_path, out.path());
        debug!(?cmd, "running neural lip-sync");
        self.run(cmd, &scratch.path().join("stderr.log"), request)?;

        let written = std::fs::metadata(out.path()).map(|m| m.len()).unwrap_or(0);
        if written == 0 {
            warn!("neural lip-sync produced no output");
            return Err(SayfaceError::NeuralProvider(
                "inference finished without writing a video".into(),
            ));
        }

        let path = request.output_dir.join(format!("{}.mp4", request.stem));
        out.persist(&path)
            .map_err(|e| SayfaceError::NeuralProvider(format!("failed to persist video: {e}")))?;

        let fps = self.config.fps;
        let frame_count = (request.audio.duration_ms() * u64::from(fps)).div_ceil(1000);
        let (width, height) = request.avatar.canvas.dimensions();
        info!(path = %path.display(), "neural lip-sync finished");
        Ok(VideoArtifact {
            path,
            frame_count,
            fps,
            width,
            height,
            format: OutputFormat::Mp4,
        })
    }
}
