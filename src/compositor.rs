//! Per-frame mouth overlay.
//!
//! Each frame is a copy of the avatar canvas with one mouth shape blended in
//! at 80% opacity. Pixels outside the shape are left exactly as rendered.

use image::RgbImage;

use crate::avatar::Avatar;
use crate::face::FaceRect;
use crate::raster::{Color, Coverage, Ellipse, paint_ellipse};
use crate::viseme::VisemeState;

/// Overlay weight; the original pixel keeps the rest.
pub const OVERLAY_ALPHA: f32 = 0.8;
/// Half-height of the closed mouth line in pixels.
const CLOSED_HALF_HEIGHT: f32 = 3.0;

/// Mouth shape for one frame, in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouthShape {
    pub center: (i64, i64),
    pub half_width: f32,
    pub half_height: f32,
    pub color: Color,
    /// Closed mouths only draw the lower half of the ellipse.
    pub lower_half_only: bool,
}

impl MouthShape {
    /// Shape for `state`, anchored on the avatar's face rect.
    pub fn for_state(face: &FaceRect, state: VisemeState) -> Self {
        let w = f64::from(face.w);
        let h = f64::from(face.h);
        let center = (
            i64::from(face.x) + i64::from(face.w / 2),
            i64::from(face.y) + (h * 0.65).round() as i64,
        );
        let half_width = (w * 0.25).round() as f32;
        let open = |ratio: f64, color: Color| Self {
            center,
            half_width,
            half_height: (h * ratio).round() as f32,
            color,
            lower_half_only: false,
        };
        match state {
            VisemeState::WideOpen => open(0.22, Color::new(60, 40, 40)),
            VisemeState::Open => open(0.16, Color::new(70, 45, 45)),
            VisemeState::Half => open(0.10, Color::new(80, 50, 50)),
            VisemeState::Closed => Self {
                center,
                half_width,
                half_height: CLOSED_HALF_HEIGHT,
                color: Color::new(100, 70, 70),
                lower_half_only: true,
            },
        }
    }

    fn ellipse(&self) -> Ellipse {
        Ellipse::around_pixel(self.center.0, self.center.1, self.half_width, self.half_height)
    }

    fn coverage(&self) -> Coverage {
        if self.lower_half_only {
            Coverage::Sector {
                start: 0.0,
                end: 180.0,
            }
        } else {
            Coverage::Fill
        }
    }
}

fn blend(overlay: u8, original: u8) -> u8 {
    (OVERLAY_ALPHA * f32::from(overlay) + (1.0 - OVERLAY_ALPHA) * f32::from(original))
        .round()
        .clamp(0.0, 255.0) as u8
}

/// Blend `shape` into `frame` in place.
pub fn apply_mouth(frame: &mut RgbImage, shape: &MouthShape) {
    let overlay = shape.color.to_rgb();
    paint_ellipse(frame, &shape.ellipse(), shape.coverage(), |px| {
        for c in 0..3 {
            px.0[c] = blend(overlay.0[c], px.0[c]);
        }
    });
}

/// A copy of the avatar canvas with the mouth drawn for `state`.
pub fn composite_frame(avatar: &Avatar, state: VisemeState) -> RgbImage {
    let mut frame = avatar.canvas.clone();
    apply_mouth(&mut frame, &MouthShape::for_state(&avatar.face, state));
    frame
}

/// Produces video frames lazily from a state sequence.
#[derive(Debug, Clone, Copy)]
pub struct FrameCompositor<'a> {
    avatar: &'a Avatar,
}

impl<'a> FrameCompositor<'a> {
    pub fn new(avatar: &'a Avatar) -> Self {
        Self { avatar }
    }

    /// One frame per state, in order.
    pub fn frames<I>(self, states: I) -> impl Iterator<Item = RgbImage> + 'a
    where
        I: IntoIterator<Item = VisemeState>,
        I::IntoIter: 'a,
    {
        let avatar = self.avatar;
        states
            .into_iter()
            .map(move |state| composite_frame(avatar, state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    const BASE: Rgb<u8> = Rgb([200, 200, 200]);

    fn flat_avatar(face: FaceRect) -> Avatar {
        Avatar {
            canvas: RgbImage::from_pixel(512, 512, BASE),
            face,
        }
    }

    fn changed(a: &RgbImage, b: &RgbImage) -> Vec<(u32, u32)> {
        a.enumerate_pixels()
            .zip(b.pixels())
            .filter(|((_, _, p), q)| p != q)
            .map(|((x, y, _), _)| (x, y))
            .collect()
    }

    #[test]
    fn shapes_follow_face_ratios() {
        let face = FaceRect::new(100, 80, 200, 200);
        let wide = MouthShape::for_state(&face, VisemeState::WideOpen);
        assert_eq!(wide.center, (200, 210));
        assert_eq!(wide.half_width, 50.0);
        assert_eq!(wide.half_height, 44.0);
        assert_eq!(MouthShape::for_state(&face, VisemeState::Open).half_height, 32.0);
        assert_eq!(MouthShape::for_state(&face, VisemeState::Half).half_height, 20.0);
        let closed = MouthShape::for_state(&face, VisemeState::Closed);
        assert_eq!(closed.half_height, 3.0);
        assert!(closed.lower_half_only);
    }

    #[test]
    fn covered_pixels_are_blended_eighty_twenty() {
        let face = FaceRect::new(100, 80, 200, 200);
        let avatar = flat_avatar(face);
        let frame = composite_frame(&avatar, VisemeState::WideOpen);
        // round(0.8 * 60 + 0.2 * 200) = 88, round(0.8 * 40 + 0.2 * 200) = 72
        assert_eq!(*frame.get_pixel(200, 210), Rgb([88, 72, 72]));
    }

    #[test]
    fn pixels_outside_the_mouth_are_untouched() {
        let avatar = flat_avatar(FaceRect::new(100, 80, 200, 200));
        let frame = composite_frame(&avatar, VisemeState::Open);
        for (x, y) in changed(&avatar.canvas, &frame) {
            let dx = (x as f32 + 0.5 - 200.5) / 50.0;
            let dy = (y as f32 + 0.5 - 210.5) / 32.0;
            assert!(dx * dx + dy * dy <= 1.0, "({x}, {y}) outside mouth");
        }
        assert_eq!(*frame.get_pixel(10, 10), BASE);
    }

    #[test]
    fn wider_states_cover_more_pixels() {
        let avatar = flat_avatar(FaceRect::new(100, 80, 200, 200));
        let area = |s| changed(&avatar.canvas, &composite_frame(&avatar, s)).len();
        let closed = area(VisemeState::Closed);
        let half = area(VisemeState::Half);
        let open = area(VisemeState::Open);
        let wide = area(VisemeState::WideOpen);
        assert!(closed > 0);
        assert!(closed < half && half < open && open < wide);
    }

    #[test]
    fn closed_mouth_only_covers_lower_half() {
        let avatar = flat_avatar(FaceRect::new(100, 80, 200, 200));
        let frame = composite_frame(&avatar, VisemeState::Closed);
        for (_, y) in changed(&avatar.canvas, &frame) {
            assert!(y >= 210);
        }
    }

    #[test]
    fn avatar_canvas_is_not_mutated() {
        let avatar = flat_avatar(FaceRect::new(0, 0, 100, 100));
        let before = avatar.canvas.clone();
        let frames: Vec<RgbImage> = FrameCompositor::new(&avatar)
            .frames(vec![VisemeState::WideOpen, VisemeState::Closed])
            .collect();
        assert_eq!(frames.len(), 2);
        assert_eq!(avatar.canvas, before);
        assert_ne!(frames[0], frames[1]);
    }

    #[test]
    fn mouth_off_canvas_is_clipped() {
        // Source face far larger than the canvas: anchor lands outside it.
        let avatar = flat_avatar(FaceRect::new(900, 900, 400, 400));
        let frame = composite_frame(&avatar, VisemeState::WideOpen);
        assert_eq!(frame, avatar.canvas);
    }
}
