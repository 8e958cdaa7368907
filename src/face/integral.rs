//! Summed-area tables over a grayscale image.

use image::GrayImage;

/// Integral and squared-integral images with one row/column of zero padding.
pub struct IntegralImage {
    width: u32,
    height: u32,
    sum: Vec<u64>,
    sq_sum: Vec<u64>,
}

impl IntegralImage {
    pub fn new(gray: &GrayImage) -> Self {
        let (width, height) = gray.dimensions();
        let stride = width as usize + 1;
        let mut sum = vec![0u64; stride * (height as usize + 1)];
        let mut sq_sum = vec![0u64; stride * (height as usize + 1)];

        for y in 0..height as usize {
            let mut row = 0u64;
            let mut row_sq = 0u64;
            for x in 0..width as usize {
                let v = u64::from(gray.get_pixel(x as u32, y as u32).0[0]);
                row += v;
                row_sq += v * v;
                let idx = (y + 1) * stride + x + 1;
                sum[idx] = sum[idx - stride] + row;
                sq_sum[idx] = sq_sum[idx - stride] + row_sq;
            }
        }

        Self {
            width,
            height,
            sum,
            sq_sum,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn lookup(table: &[u64], stride: usize, x: u32, y: u32, w: u32, h: u32) -> u64 {
        let (x0, y0) = (x as usize, y as usize);
        let (x1, y1) = (x0 + w as usize, y0 + h as usize);
        table[y1 * stride + x1] + table[y0 * stride + x0]
            - table[y0 * stride + x1]
            - table[y1 * stride + x0]
    }

    /// Sum of pixel values in the rectangle. The rectangle must lie inside the image.
    pub fn rect_sum(&self, x: u32, y: u32, w: u32, h: u32) -> u64 {
        Self::lookup(&self.sum, self.width as usize + 1, x, y, w, h)
    }

    /// Mean pixel value in the rectangle, `0.0` for an empty one.
    pub fn rect_mean(&self, x: u32, y: u32, w: u32, h: u32) -> f64 {
        let area = u64::from(w) * u64::from(h);
        if area == 0 {
            return 0.0;
        }
        self.rect_sum(x, y, w, h) as f64 / area as f64
    }

    /// Standard deviation of pixel values in the rectangle.
    pub fn rect_std_dev(&self, x: u32, y: u32, w: u32, h: u32) -> f64 {
        let area = u64::from(w) * u64::from(h);
        if area == 0 {
            return 0.0;
        }
        let n = area as f64;
        let mean = self.rect_sum(x, y, w, h) as f64 / n;
        let sq = Self::lookup(&self.sq_sum, self.width as usize + 1, x, y, w, h) as f64 / n;
        (sq - mean * mean).max(0.0).sqrt()
    }
}
