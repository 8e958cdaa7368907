//! Skin and hair color sampling around a detected face.
//!
//! Both samplers are pure functions of `(image, face)`. When the sampled region
//! is empty (a face touching the image border) they return a fixed default,
//! which callers treat like any other sampled color.

use image::RgbImage;

use crate::face::FaceRect;
use crate::raster::Color;

/// Skin tone used when the sample square is empty.
pub const DEFAULT_SKIN: Color = Color::new(255, 220, 177);
/// Hair color used when there is no room above the face.
pub const DEFAULT_HAIR: Color = Color::new(50, 30, 20);
/// Hair sampled just above the face is washed out by skin and background.
pub const HAIR_DARKEN: f32 = 0.7;

/// Mean color of `[x0, x1) × [y0, y1)`, `None` if the region is empty.
fn region_mean(image: &RgbImage, x0: u32, y0: u32, x1: u32, y1: u32) -> Option<[f64; 3]> {
    let (w, h) = image.dimensions();
    let (x1, y1) = (x1.min(w), y1.min(h));
    if x0 >= x1 || y0 >= y1 {
        return None;
    }
    let mut acc = [0u64; 3];
    for y in y0..y1 {
        for x in x0..x1 {
            let px = image.get_pixel(x, y).0;
            for c in 0..3 {
                acc[c] += u64::from(px[c]);
            }
        }
    }
    let n = (u64::from(x1 - x0) * u64::from(y1 - y0)) as f64;
    Some(acc.map(|v| v as f64 / n))
}

/// Mean color of a square centered on the face, half-width `min(w, h) / 4`.
pub fn sample_skin_tone(image: &RgbImage, face: &FaceRect) -> Color {
    let (cx, cy) = face.center();
    let half = face.w.min(face.h) / 4;
    region_mean(
        image,
        cx.saturating_sub(half),
        cy.saturating_sub(half),
        cx + half,
        cy + half,
    )
    .map_or(DEFAULT_SKIN, |m| {
        Color::new(m[0] as u8, m[1] as u8, m[2] as u8)
    })
}

/// Darkened mean color of the band `h / 3` tall directly above the face.
pub fn sample_hair_color(image: &RgbImage, face: &FaceRect) -> Color {
    region_mean(
        image,
        face.x,
        face.y.saturating_sub(face.h / 3),
        face.x + face.w,
        face.y,
    )
    .map_or(DEFAULT_HAIR, |m| {
        let dark = m.map(|c| (c * f64::from(HAIR_DARKEN)).round().clamp(0.0, 255.0) as u8);
        Color::new(dark[0], dark[1], dark[2])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn skin_is_mean_of_center_square() {
        let mut img = RgbImage::from_pixel(100, 100, Rgb([0, 0, 0]));
        // Center square for face (20,20,40,40) spans [30, 50) on both axes.
        for y in 30..50 {
            for x in 30..50 {
                let v = if x < 40 { 100 } else { 201 };
                img.put_pixel(x, y, Rgb([v, 50, 10]));
            }
        }
        let skin = sample_skin_tone(&img, &FaceRect::new(20, 20, 40, 40));
        assert_eq!(skin, Color::new(150, 50, 10));
    }

    #[test]
    fn degenerate_face_returns_default_skin() {
        let img = RgbImage::from_pixel(10, 10, Rgb([9, 9, 9]));
        assert_eq!(sample_skin_tone(&img, &FaceRect::new(2, 2, 3, 3)), DEFAULT_SKIN);
    }

    #[test]
    fn hair_band_is_darkened() {
        let mut img = RgbImage::from_pixel(60, 60, Rgb([200, 200, 200]));
        for y in 0..30 {
            for x in 0..60 {
                img.put_pixel(x, y, Rgb([100, 60, 33]));
            }
        }
        let hair = sample_hair_color(&img, &FaceRect::new(15, 30, 30, 30));
        assert_eq!(hair, Color::new(70, 42, 23));
    }

    #[test]
    fn face_at_top_edge_returns_default_hair() {
        let img = RgbImage::from_pixel(50, 50, Rgb([1, 2, 3]));
        assert_eq!(sample_hair_color(&img, &FaceRect::new(5, 0, 20, 20)), DEFAULT_HAIR);
    }

    #[test]
    fn hair_band_is_clipped_to_image_top() {
        let img = RgbImage::from_pixel(50, 50, Rgb([100, 100, 100]));
        // Band would start at y = 2 - 10; it is clipped to [0, 2).
        let hair = sample_hair_color(&img, &FaceRect::new(0, 2, 30, 30));
        assert_eq!(hair, Color::new(70, 70, 70));
    }
}
