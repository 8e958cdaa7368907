//! Minimal deterministic rasterizer for the avatar canvas.
//!
//! Shapes are described in continuous canvas coordinates and sampled at pixel
//! centers, so the same inputs always cover the same pixels. Everything here
//! draws onto an [`image::RgbImage`] in place.

use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};

/// An RGB color, each channel in `[0, 255]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    /// Create a color from its channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Multiply every channel by `factor`, rounding to the nearest value.
    #[must_use]
    pub fn darken(self, factor: f32) -> Self {
        Self {
            r: scale_channel(self.r, factor),
            g: scale_channel(self.g, factor),
            b: scale_channel(self.b, factor),
        }
    }

    /// Pixel value for the `image` crate.
    pub fn to_rgb(self) -> Rgb<u8> {
        Rgb([self.r, self.g, self.b])
    }
}

fn scale_channel(c: u8, factor: f32) -> u8 {
    (f32::from(c) * factor).round().clamp(0.0, 255.0) as u8
}

/// Axis-aligned box `[x0, x1) × [y0, y1)` in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BBox {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x0 && px < self.x1 && py >= self.y0 && py < self.y1
    }

    /// Integer pixel range whose centers may fall inside the box, clipped to
    /// an image of `width × height`. `None` if nothing can be covered.
    fn pixel_span(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        let clamp = |v: f32, max: u32| v.floor().clamp(0.0, max as f32) as u32;
        let x0 = clamp(self.x0, width);
        let y0 = clamp(self.y0, height);
        let x1 = clamp(self.x1 + 1.0, width);
        let y1 = clamp(self.y1 + 1.0, height);
        (x0 < x1 && y0 < y1).then_some((x0, y0, x1, y1))
    }
}

/// Ellipse given by center and semi-axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipse {
    pub cx: f32,
    pub cy: f32,
    pub rx: f32,
    pub ry: f32,
}

impl Ellipse {
    /// Ellipse inscribed in a bounding box.
    pub fn inscribed(bbox: BBox) -> Self {
        Self {
            cx: (bbox.x0 + bbox.x1) / 2.0,
            cy: (bbox.y0 + bbox.y1) / 2.0,
            rx: (bbox.x1 - bbox.x0) / 2.0,
            ry: (bbox.y1 - bbox.y0) / 2.0,
        }
    }

    /// Ellipse centered on the middle of pixel `(x, y)`.
    pub fn around_pixel(x: i64, y: i64, rx: f32, ry: f32) -> Self {
        Self {
            cx: x as f32 + 0.5,
            cy: y as f32 + 0.5,
            rx,
            ry,
        }
    }

    fn bbox(&self) -> BBox {
        BBox::new(
            self.cx - self.rx,
            self.cy - self.ry,
            self.cx + self.rx,
            self.cy + self.ry,
        )
    }

    fn contains(&self, px: f32, py: f32) -> bool {
        if self.rx <= 0.0 || self.ry <= 0.0 {
            return false;
        }
        let dx = (px - self.cx) / self.rx;
        let dy = (py - self.cy) / self.ry;
        dx * dx + dy * dy <= 1.0
    }

    /// Angle of a point around the center in degrees, `[0, 360)`, measured
    /// clockwise from +x because image y grows downwards.
    fn angle_of(&self, px: f32, py: f32) -> f32 {
        let deg = (py - self.cy).atan2(px - self.cx).to_degrees();
        if deg < 0.0 { deg + 360.0 } else { deg }
    }

    fn shrunk(&self, by: f32) -> Self {
        Self {
            rx: self.rx - by,
            ry: self.ry - by,
            ..*self
        }
    }
}

/// Which part of an ellipse a paint operation covers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coverage {
    /// Whole interior.
    Fill,
    /// Interior restricted to the angular sector `[start, end]` degrees.
    Sector { start: f32, end: f32 },
    /// Ring of the given width inside the boundary.
    Outline { width: f32 },
    /// Ring of the given width restricted to `[start, end]` degrees.
    Arc { start: f32, end: f32, width: f32 },
}

impl Coverage {
    fn covers(&self, shape: &Ellipse, px: f32, py: f32) -> bool {
        if !shape.contains(px, py) {
            return false;
        }
        let in_sector = |start: f32, end: f32| {
            let a = shape.angle_of(px, py);
            a >= start && a <= end
        };
        match *self {
            Coverage::Fill => true,
            Coverage::Sector { start, end } => in_sector(start, end),
            Coverage::Outline { width } => !shape.shrunk(width).contains(px, py),
            Coverage::Arc { start, end, width } => {
                !shape.shrunk(width).contains(px, py) && in_sector(start, end)
            }
        }
    }
}

/// Call `paint` for every pixel of `img` covered by `shape`.
pub fn paint_ellipse<F>(img: &mut RgbImage, shape: &Ellipse, coverage: Coverage, mut paint: F)
where
    F: FnMut(&mut Rgb<u8>),
{
    let (w, h) = img.dimensions();
    let Some((x0, y0, x1, y1)) = shape.bbox().pixel_span(w, h) else {
        return;
    };
    for y in y0..y1 {
        for x in x0..x1 {
            if coverage.covers(shape, x as f32 + 0.5, y as f32 + 0.5) {
                paint(img.get_pixel_mut(x, y));
            }
        }
    }
}

/// Fill an ellipse with a solid color.
pub fn fill_ellipse(img: &mut RgbImage, shape: &Ellipse, color: Color) {
    paint_ellipse(img, shape, Coverage::Fill, |px| *px = color.to_rgb());
}

/// Fill an ellipse and stroke its boundary with `outline`.
pub fn fill_ellipse_outlined(
    img: &mut RgbImage,
    shape: &Ellipse,
    fill: Color,
    outline: Color,
    width: f32,
) {
    fill_ellipse(img, shape, fill);
    paint_ellipse(img, shape, Coverage::Outline { width }, |px| {
        *px = outline.to_rgb();
    });
}

/// Stroke the part of an ellipse boundary between `start` and `end` degrees.
pub fn stroke_arc(
    img: &mut RgbImage,
    shape: &Ellipse,
    start: f32,
    end: f32,
    width: f32,
    color: Color,
) {
    paint_ellipse(img, shape, Coverage::Arc { start, end, width }, |px| {
        *px = color.to_rgb();
    });
}

/// Fill an axis-aligned rectangle.
pub fn fill_rect(img: &mut RgbImage, bbox: BBox, color: Color) {
    fill_rounded_rect(img, bbox, 0.0, color);
}

/// Fill a rectangle whose corners are rounded with `radius`.
pub fn fill_rounded_rect(img: &mut RgbImage, bbox: BBox, radius: f32, color: Color) {
    let (w, h) = img.dimensions();
    let Some((x0, y0, x1, y1)) = bbox.pixel_span(w, h) else {
        return;
    };
    let r = radius
        .min((bbox.x1 - bbox.x0) / 2.0)
        .min((bbox.y1 - bbox.y0) / 2.0)
        .max(0.0);
    for y in y0..y1 {
        for x in x0..x1 {
            let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);
            if !bbox.contains(px, py) {
                continue;
            }
            // Distance to the nearest corner circle center, zero on the straight edges.
            let dx = (bbox.x0 + r - px).max(px - (bbox.x1 - r)).max(0.0);
            let dy = (bbox.y0 + r - py).max(py - (bbox.y1 - r)).max(0.0);
            if dx * dx + dy * dy <= r * r {
                img.put_pixel(x, y, color.to_rgb());
            }
        }
    }
}
