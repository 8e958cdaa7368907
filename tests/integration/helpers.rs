//! Shared helpers for integration tests.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{ImageFormat, Rgb, RgbImage};
use sayface::SayfaceConfig;
use sayface::config::VideoContainer;

pub(crate) const SAMPLE_RATE: u32 = 16_000;

/// 400×400 synthetic portrait: a flat skin block with two dark eye bars on a
/// blue background. The face block spans x 100..300, y 80..280.
pub(crate) fn portrait() -> RgbImage {
    portrait_at(100, 80)
}

/// The same 200×200 face block and eye bars with the block's top-left
/// corner at `(ox, oy)`.
pub(crate) fn portrait_at(ox: u32, oy: u32) -> RgbImage {
    let mut img = RgbImage::from_pixel(400, 400, Rgb([40, 60, 90]));
    for y in oy..oy + 200 {
        for x in ox..ox + 200 {
            img.put_pixel(x, y, Rgb([220, 190, 160]));
        }
    }
    for y in oy + 60..oy + 84 {
        for x in (ox + 40..ox + 80).chain(ox + 120..ox + 160) {
            img.put_pixel(x, y, Rgb([30, 30, 30]));
        }
    }
    img
}

pub(crate) fn encode_png(img: &RgbImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("encode png");
    bytes
}

/// Peak amplitude of a sine whose RMS level is `dbfs`.
pub(crate) fn sine_peak_for_dbfs(dbfs: f64) -> f32 {
    (10f64.powf(dbfs / 20.0) * std::f64::consts::SQRT_2) as f32
}

/// Mono sine samples; 400 Hz at 16 kHz gives whole periods per 50 ms window.
pub(crate) fn sine(duration_ms: u32, peak: f32) -> Vec<f32> {
    let n = (u64::from(SAMPLE_RATE) * u64::from(duration_ms) / 1000) as usize;
    (0..n)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            peak * (2.0 * std::f32::consts::PI * 400.0 * t).sin()
        })
        .collect()
}

/// Write 16-bit mono PCM to `path`.
pub(crate) fn write_wav(path: &Path, samples: &[f32]) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).expect("create wav");
    for &s in samples {
        writer
            .write_sample((s.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16)
            .expect("write sample");
    }
    writer.finalize().expect("finalize wav");
}

/// Config writing into `dir`, with Y4M output and no neural tool.
pub(crate) fn temp_config(dir: &Path) -> SayfaceConfig {
    let mut config = SayfaceConfig::default();
    config.storage.avatar_dir = dir.join("avatars");
    config.storage.video_dir = dir.join("videos");
    config.video.container = VideoContainer::Y4m;
    config.neural.enabled = false;
    config
}

pub(crate) fn dir_entries(dir: &Path) -> Vec<PathBuf> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries.map(|e| e.expect("dir entry").path()).collect(),
        Err(_) => Vec::new(),
    }
}

/// `a` is within `pct` percent of `b`.
pub(crate) fn near(a: u32, b: u32, pct: f64) -> bool {
    (f64::from(a) - f64::from(b)).abs() <= f64::from(b) * pct / 100.0
}
