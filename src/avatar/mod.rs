//! Procedural cartoon avatar rendering.
//!
//! The avatar is drawn on a fixed 512×512 canvas. All geometry derives from
//! the detected face width through a single scale factor, so two renders of
//! the same face with the same colors are byte-identical.

pub mod store;

use image::RgbImage;
use tracing::debug;

use crate::color::{sample_hair_color, sample_skin_tone};
use crate::face::{FaceFeatures, FaceRect};
use crate::raster::{
    BBox, Color, Ellipse, fill_ellipse, fill_ellipse_outlined, fill_rect, fill_rounded_rect,
    stroke_arc,
};

/// Canvas side length in pixels.
pub const CANVAS_SIZE: u32 = 512;
pub const BACKGROUND: Color = Color::new(173, 216, 230);
pub const SHIRT: Color = Color::new(0, 128, 128);
pub const IRIS: Color = Color::new(100, 180, 200);
pub const MOUTH: Color = Color::new(200, 100, 100);

const EYE_WHITE: Color = Color::new(255, 255, 255);
const BLACK: Color = Color::new(0, 0, 0);

const CENTER_X: i32 = CANVAS_SIZE as i32 / 2;
const FACE_TOP: i32 = 180;
/// Largest face side after scaling.
const TARGET_FACE: f32 = 400.0;
const MAX_SCALE: f32 = 1.5;
const FACE_RATIO: f32 = 0.95;
const NECK_HEIGHT: i32 = 60;
const NECK_TUCK: i32 = 30;
const TORSO_HEIGHT: i32 = 180;
const TORSO_OVERLAP: i32 = 20;
const TORSO_RADIUS: f32 = 30.0;

/// A rendered avatar together with the source face it was drawn from.
///
/// The face rect travels with the canvas because the frame compositor
/// anchors the mouth overlay on it.
#[derive(Debug, Clone, PartialEq)]
pub struct Avatar {
    pub canvas: RgbImage,
    pub face: FaceRect,
}

/// Every position and size the renderer draws, in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub face_size: i32,
    pub neck: BBox,
    pub torso: BBox,
    pub face: BBox,
    pub hair: BBox,
    /// Whites of the left and right eye.
    pub eyes: [BBox; 2],
    pub irises: [BBox; 2],
    pub pupils: [BBox; 2],
    pub mouth: BBox,
}

impl Layout {
    /// Compute the drawing layout for a face rect.
    pub fn for_face(face: &FaceRect) -> Self {
        let longest = face.w.max(face.h).max(1) as f32;
        let scale = (TARGET_FACE / longest).min(MAX_SCALE);
        let scaled_w = (face.w as f32 * scale) as i32;
        let face_size = (scaled_w as f32 * FACE_RATIO) as i32;

        let neck_w = face_size / 3;
        let neck_top = FACE_TOP + face_size - NECK_TUCK;
        let neck = bbox(
            CENTER_X - neck_w / 2,
            neck_top,
            CENTER_X + neck_w / 2,
            neck_top + NECK_HEIGHT,
        );

        let torso_half = (face_size as f32 * 1.3 / 2.0).floor();
        let torso_top = neck_top + NECK_HEIGHT - TORSO_OVERLAP;
        let torso = BBox::new(
            CENTER_X as f32 - torso_half,
            torso_top as f32,
            CENTER_X as f32 + torso_half,
            (torso_top + TORSO_HEIGHT) as f32,
        );

        let face_left = CENTER_X - face_size / 2;
        let face_box = bbox(face_left, FACE_TOP, face_left + face_size, FACE_TOP + face_size);

        let hair_half = (face_size as f32 * 1.1 / 2.0).floor();
        let hair = BBox::new(
            CENTER_X as f32 - hair_half,
            (FACE_TOP - face_size / 3) as f32,
            CENTER_X as f32 + hair_half,
            (FACE_TOP + face_size / 2) as f32,
        );

        let eye_y = FACE_TOP + face_size / 3;
        let spacing = face_size / 4;
        let ew = face_size / 7;
        let eh = face_size / 9;
        let eye = |ex: i32| bbox(ex - ew, eye_y, ex + ew, eye_y + eh * 2);
        let iris = |ex: i32| {
            let top = eye_y + eh / 3;
            bbox(ex - ew / 2, top, ex + ew / 2, top + eh)
        };
        let pupil = |ex: i32| bbox(ex - ew / 4, eye_y + eh / 2, ex + ew / 4, eye_y + eh);
        let (left, right) = (CENTER_X - spacing, CENTER_X + spacing);

        let mouth_y = FACE_TOP as f32 + face_size as f32 * 0.65;
        let mouth_w = face_size / 4;
        let mouth = BBox::new(
            (CENTER_X - mouth_w) as f32,
            mouth_y,
            (CENTER_X + mouth_w) as f32,
            mouth_y + (mouth_w / 2) as f32,
        );

        Self {
            face_size,
            neck,
            torso,
            face: face_box,
            hair,
            eyes: [eye(left), eye(right)],
            irises: [iris(left), iris(right)],
            pupils: [pupil(left), pupil(right)],
            mouth,
        }
    }
}

fn bbox(x0: i32, y0: i32, x1: i32, y1: i32) -> BBox {
    BBox::new(x0 as f32, y0 as f32, x1 as f32, y1 as f32)
}

/// Draw the avatar canvas from face geometry and sampled colors.
pub fn render_canvas(face: &FaceRect, skin: Color, hair: Color) -> RgbImage {
    let layout = Layout::for_face(face);
    let mut canvas = RgbImage::from_pixel(CANVAS_SIZE, CANVAS_SIZE, BACKGROUND.to_rgb());

    fill_rect(&mut canvas, layout.neck, skin.darken(0.9));
    fill_rounded_rect(&mut canvas, layout.torso, TORSO_RADIUS, SHIRT);
    fill_ellipse_outlined(
        &mut canvas,
        &Ellipse::inscribed(layout.face),
        skin,
        skin.darken(0.85),
        2.0,
    );
    // Hair goes over the face; only the crown and sides stay visible.
    fill_ellipse(&mut canvas, &Ellipse::inscribed(layout.hair), hair);

    for i in 0..2 {
        fill_ellipse_outlined(
            &mut canvas,
            &Ellipse::inscribed(layout.eyes[i]),
            EYE_WHITE,
            BLACK,
            2.0,
        );
        fill_ellipse(&mut canvas, &Ellipse::inscribed(layout.irises[i]), IRIS);
        fill_ellipse(&mut canvas, &Ellipse::inscribed(layout.pupils[i]), BLACK);
    }

    stroke_arc(&mut canvas, &Ellipse::inscribed(layout.mouth), 0.0, 180.0, 3.0, MOUTH);
    canvas
}

/// Sample colors from the photo and draw the avatar for its primary face.
///
/// Eye rects are part of the detection result but do not influence the
/// drawing; the cartoon eyes are placed from the face size alone.
pub fn render_avatar(image: &RgbImage, features: &FaceFeatures) -> Avatar {
    let skin = sample_skin_tone(image, &features.face);
    let hair = sample_hair_color(image, &features.face);
    debug!(?skin, ?hair, "sampled avatar colors");
    Avatar {
        canvas: render_canvas(&features.face, skin, hair),
        face: features.face,
    }
}
