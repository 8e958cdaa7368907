//! YUV4MPEG2 writer (4:4:4, BT.601 studio range).
//!
//! Uncompressed and written entirely in-process, so it works on machines
//! without any video tooling installed.

use std::io::Write;

use image::RgbImage;

use super::FrameSink;
use crate::error::{Result, SayfaceError};

/// Streams frames into a `.y4m` file.
pub struct Y4mSink<W: Write> {
    out: W,
    width: u32,
    height: u32,
    planes: Vec<u8>,
}

impl<W: Write> Y4mSink<W> {
    /// Write the stream header.
    ///
    /// # Errors
    ///
    /// Returns [`SayfaceError::EncoderInit`] if the header cannot be written.
    pub fn new(mut out: W, width: u32, height: u32, fps: u32) -> Result<Self> {
        writeln!(out, "YUV4MPEG2 W{width} H{height} F{fps}:1 Ip A1:1 C444")
            .map_err(|e| SayfaceError::EncoderInit(format!("failed to write y4m header: {e}")))?;
        let plane = width as usize * height as usize;
        Ok(Self {
            out,
            width,
            height,
            planes: vec![0; plane * 3],
        })
    }
}

/// BT.601 RGB to studio-range YCbCr.
pub(crate) fn rgb_to_ycbcr(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let (r, g, b) = (i32::from(r), i32::from(g), i32::from(b));
    let y = ((66 * r + 129 * g + 25 * b + 128) >> 8) + 16;
    let cb = ((-38 * r - 74 * g + 112 * b + 128) >> 8) + 128;
    let cr = ((112 * r - 94 * g - 18 * b + 128) >> 8) + 128;
    (y as u8, cb as u8, cr as u8)
}

impl<W: Write> FrameSink for Y4mSink<W> {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        if frame.dimensions() != (self.width, self.height) {
            return Err(SayfaceError::Encoding(format!(
                "frame is {:?}, stream is {}x{}",
                frame.dimensions(),
                self.width,
                self.height
            )));
        }
        let plane = self.width as usize * self.height as usize;
        let (y_plane, chroma) = self.planes.split_at_mut(plane);
        let (cb_plane, cr_plane) = chroma.split_at_mut(plane);
        for (i, px) in frame.pixels().enumerate() {
            let (y, cb, cr) = rgb_to_ycbcr(px.0[0], px.0[1], px.0[2]);
            y_plane[i] = y;
            cb_plane[i] = cb;
            cr_plane[i] = cr;
        }
        self.out
            .write_all(b"FRAME\n")
            .and_then(|()| self.out.write_all(&self.planes))
            .map_err(|e| SayfaceError::Encoding(format!("failed to write y4m frame: {e}")))
    }

    fn finish(mut self: Box<Self>) -> Result<()> {
        self.out
            .flush()
            .map_err(|e| SayfaceError::Encoding(format!("failed to flush y4m stream: {e}")))
    }
}
