//! Boosted cascade of Haar-like features with a multi-scale window scan.
//!
//! Feature rectangles are stored in unit window coordinates so a cascade can
//! be evaluated at any window size without rescaling the image. A feature's
//! value is the weighted sum of its rectangle means divided by the window's
//! standard deviation, which keeps thresholds independent of exposure.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::Rect;
use super::grouping::group_rectangles;
use super::integral::IntegralImage;
use crate::error::{Result, SayfaceError};

/// Windows flatter than this (in gray levels) are never classified as hits.
const MIN_WINDOW_STD_DEV: f64 = 2.0;

/// One weighted rectangle of a Haar-like feature, in `[0, 1]` window units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HaarRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub weight: f32,
}

impl HaarRect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32, weight: f32) -> Self {
        Self { x, y, w, h, weight }
    }
}

/// A decision stump over one feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeakClassifier {
    pub rects: Vec<HaarRect>,
    /// Feature value threshold, in units of window standard deviation.
    pub threshold: f32,
    /// Vote when the feature value is below `threshold`.
    pub below: f32,
    /// Vote when the feature value is at or above `threshold`.
    pub above: f32,
}

impl WeakClassifier {
    /// A stump that votes `1.0` only when the feature reaches `threshold`.
    pub fn at_least(threshold: f32, rects: Vec<HaarRect>) -> Self {
        Self {
            rects,
            threshold,
            below: 0.0,
            above: 1.0,
        }
    }
}

/// Weak classifiers whose summed votes must reach `threshold`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub classifiers: Vec<WeakClassifier>,
    pub threshold: f32,
}

/// A complete cascade: a window is a hit only if it passes every stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cascade {
    pub name: String,
    /// Base window width in pixels (the smallest scanned window).
    pub window_width: u32,
    /// Base window height in pixels.
    pub window_height: u32,
    pub stages: Vec<Stage>,
}

/// Multi-scale scan settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanParams {
    /// Window growth per scale step (> 1).
    pub scale_factor: f32,
    /// A group must contain more than this many raw hits to be reported.
    pub min_neighbors: usize,
    /// Windows smaller than this are not scanned.
    pub min_width: u32,
    pub min_height: u32,
    /// Windows larger than this are not scanned.
    pub max_width: u32,
    pub max_height: u32,
    /// Relative tolerance used when grouping raw hits.
    pub group_eps: f32,
}

impl Cascade {
    /// Load a cascade from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let cascade: Cascade = serde_json::from_str(&content).map_err(|e| {
            SayfaceError::Config(format!("invalid cascade {}: {e}", path.display()))
        })?;
        cascade.validate()?;
        Ok(cascade)
    }

    /// Check structural invariants the scanner relies on.
    ///
    /// # Errors
    ///
    /// Returns a config error describing the first violated invariant.
    pub fn validate(&self) -> Result<()> {
        if self.window_width == 0 || self.window_height == 0 {
            return Err(SayfaceError::Config(format!(
                "cascade {}: window must be non-empty",
                self.name
            )));
        }
        if self.stages.is_empty() {
            return Err(SayfaceError::Config(format!(
                "cascade {}: no stages",
                self.name
            )));
        }
        let in_unit = |v: f32| (0.0..=1.0).contains(&v);
        for stage in &self.stages {
            for weak in &stage.classifiers {
                for r in &weak.rects {
                    if !(in_unit(r.x) && in_unit(r.y) && in_unit(r.x + r.w) && in_unit(r.y + r.h))
                    {
                        return Err(SayfaceError::Config(format!(
                            "cascade {}: feature rect {r:?} leaves the window",
                            self.name
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Classify a single window of the integral image.
    pub fn classify(&self, ii: &IntegralImage, window: Rect) -> bool {
        let std_dev = ii.rect_std_dev(window.x, window.y, window.w, window.h);
        if std_dev < MIN_WINDOW_STD_DEV {
            return false;
        }
        self.stages.iter().all(|stage| {
            let votes: f32 = stage
                .classifiers
                .iter()
                .map(|weak| {
                    let value = feature_value(ii, window, &weak.rects) / std_dev;
                    if value < f64::from(weak.threshold) {
                        weak.below
                    } else {
                        weak.above
                    }
                })
                .sum();
            votes >= stage.threshold
        })
    }

    /// All raw window hits over every scale, before grouping.
    pub fn scan(&self, ii: &IntegralImage, params: &ScanParams) -> Vec<Rect> {
        let (img_w, img_h) = (ii.width(), ii.height());
        let mut hits = Vec::new();
        let growth = params.scale_factor.max(1.01);

        for k in 0.. {
            let factor = growth.powi(k);
            let win_w = (self.window_width as f32 * factor).round() as u32;
            let win_h = (self.window_height as f32 * factor).round() as u32;
            if win_w > img_w.min(params.max_width) || win_h > img_h.min(params.max_height) {
                break;
            }
            if win_w < params.min_width || win_h < params.min_height {
                continue;
            }
            // Coarser steps at small scales, as in the classic detector.
            let step = if factor > 2.0 { factor } else { 2.0 * factor };
            let step = (step.round() as u32).max(1);

            let mut y = 0;
            while y + win_h <= img_h {
                let mut x = 0;
                while x + win_w <= img_w {
                    let window = Rect::new(x, y, win_w, win_h);
                    if self.classify(ii, window) {
                        hits.push(window);
                    }
                    x += step;
                }
                y += step;
            }
        }
        hits
    }

    /// Scan and group, returning each surviving group with its vote count.
    pub fn detect(&self, ii: &IntegralImage, params: &ScanParams) -> Vec<(Rect, usize)> {
        let hits = self.scan(ii, params);
        tracing::trace!(cascade = %self.name, raw_hits = hits.len(), "cascade scan finished");
        group_rectangles(&hits, params.min_neighbors, params.group_eps)
            .into_iter()
            .map(|(r, n)| (r.clip_to(ii.width(), ii.height()), n))
            .filter(|(r, _)| r.area() > 0)
            .collect()
    }
}

fn feature_value(ii: &IntegralImage, window: Rect, rects: &[HaarRect]) -> f64 {
    rects
        .iter()
        .map(|r| {
            let px = window.x + (r.x * window.w as f32).round() as u32;
            let py = window.y + (r.y * window.h as f32).round() as u32;
            let pw = ((r.w * window.w as f32).round() as u32).max(1);
            let ph = ((r.h * window.h as f32).round() as u32).max(1);
            let pw = pw.min((window.x + window.w).saturating_sub(px)).max(1);
            let ph = ph.min((window.y + window.h).saturating_sub(py)).max(1);
            let px = px.min(ii.width().saturating_sub(pw));
            let py = py.min(ii.height().saturating_sub(ph));
            f64::from(r.weight) * ii.rect_mean(px, py, pw, ph)
        })
        .sum()
}
