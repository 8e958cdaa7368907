//! Face and eye localization in still images.
//!
//! The image is converted to grayscale, summed-area tables are built once,
//! and a cascade classifier is slid over it at every scale. Raw hits are
//! merged by neighbor vote; the largest surviving face becomes the primary
//! subject and the eye cascade is run inside it.

pub mod builtin;
pub mod cascade;
mod grouping;
mod integral;

use image::{GrayImage, RgbImage};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::DetectorConfig;
use crate::error::Result;
use cascade::{Cascade, ScanParams};
use integral::IntegralImage;

/// Axis-aligned pixel rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// Primary face region, in image coordinates.
pub type FaceRect = Rect;
/// Eye region, in the same image coordinates as the face.
pub type EyeRect = Rect;

impl Rect {
    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    pub fn area(&self) -> u64 {
        u64::from(self.w) * u64::from(self.h)
    }

    /// Center pixel, rounding down.
    pub fn center(&self) -> (u32, u32) {
        (self.x + self.w / 2, self.y + self.h / 2)
    }

    /// True when the rectangle lies entirely within `width × height`.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        u64::from(self.x) + u64::from(self.w) <= u64::from(width)
            && u64::from(self.y) + u64::from(self.h) <= u64::from(height)
    }

    /// Intersection with `[0, width) × [0, height)`.
    #[must_use]
    pub fn clip_to(&self, width: u32, height: u32) -> Self {
        let x = self.x.min(width);
        let y = self.y.min(height);
        Self {
            x,
            y,
            w: self.w.min(width - x),
            h: self.h.min(height - y),
        }
    }

    /// Shift by an origin, e.g. from crop space back to image space.
    #[must_use]
    pub fn offset(&self, dx: u32, dy: u32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }
}

/// Result of a successful detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceFeatures {
    pub face: FaceRect,
    pub eyes: Vec<EyeRect>,
}

/// Face detector holding a face cascade, an eye cascade, and scan settings.
#[derive(Debug, Clone)]
pub struct FaceDetector {
    face: Cascade,
    eyes: Cascade,
    face_params: ScanParams,
    eye_params: ScanParams,
}

impl Default for FaceDetector {
    fn default() -> Self {
        Self::new(
            builtin::frontal_face(),
            builtin::eye(),
            &DetectorConfig::default(),
        )
    }
}

impl FaceDetector {
    /// Build a detector from explicit cascades.
    pub fn new(face: Cascade, eyes: Cascade, config: &DetectorConfig) -> Self {
        let face_params = ScanParams {
            scale_factor: config.scale_factor,
            min_neighbors: config.face_min_neighbors,
            min_width: config.min_face_size,
            min_height: config.min_face_size,
            max_width: u32::MAX,
            max_height: u32::MAX,
            group_eps: config.group_eps,
        };
        let eye_params = ScanParams {
            min_neighbors: config.eye_min_neighbors,
            min_width: 0,
            min_height: 0,
            ..face_params
        };
        Self {
            face,
            eyes,
            face_params,
            eye_params,
        }
    }

    /// Build a detector from config, loading external cascades when configured.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured cascade file cannot be loaded.
    pub fn from_config(config: &DetectorConfig) -> Result<Self> {
        let face = match &config.face_cascade {
            Some(path) => Cascade::from_json_file(path)?,
            None => builtin::frontal_face(),
        };
        let eyes = match &config.eye_cascade {
            Some(path) => Cascade::from_json_file(path)?,
            None => builtin::eye(),
        };
        info!(face = %face.name, eyes = %eyes.name, "face detector ready");
        Ok(Self::new(face, eyes, config))
    }

    /// Locate the primary face and its eyes. `None` when no face is found.
    pub fn detect(&self, image: &RgbImage) -> Option<FaceFeatures> {
        let gray = image::DynamicImage::ImageRgb8(image.clone()).to_luma8();
        self.detect_gray(&gray)
    }

    /// Same as [`Self::detect`] for an already grayscale image.
    pub fn detect_gray(&self, gray: &GrayImage) -> Option<FaceFeatures> {
        let ii = IntegralImage::new(gray);
        let candidates = self.face.detect(&ii, &self.face_params);
        debug!(candidates = candidates.len(), "face candidates grouped");

        let (face, votes) = candidates.into_iter().max_by_key(|(r, _)| r.area())?;

        let crop = image::imageops::crop_imm(gray, face.x, face.y, face.w, face.h).to_image();
        let eye_ii = IntegralImage::new(&crop);
        // An eye spans at most half the face in either direction.
        let eye_params = ScanParams {
            max_width: face.w / 2,
            max_height: face.h / 2,
            ..self.eye_params
        };
        let eyes: Vec<EyeRect> = self
            .eyes
            .detect(&eye_ii, &eye_params)
            .into_iter()
            .map(|(r, _)| r.offset(face.x, face.y))
            .collect();

        info!(
            x = face.x,
            y = face.y,
            w = face.w,
            h = face.h,
            votes,
            eyes = eyes.len(),
            "face detected"
        );
        Some(FaceFeatures { face, eyes })
    }
}

/// Detect the primary face with the built-in cascades and default settings.
pub fn detect_face(image: &RgbImage) -> Option<FaceFeatures> {
    FaceDetector::default().detect(image)
}
