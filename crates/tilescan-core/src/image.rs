//! Stride-aware image view for zero-copy frame ingestion, plus an owned
//! grayscale buffer for crops and intermediate rasters.

use crate::error::Error;

/// A borrowed view into a grayscale buffer with explicit stride support.
/// This allows ingesting camera buffers with row padding or non-standard
/// layouts without copying.
#[derive(Clone, Copy)]
pub struct ImageView<'a> {
    /// Raw pixel data, row-major.
    pub data: &'a [u8],
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
    /// Distance between row starts in bytes.
    pub stride: usize,
}

impl<'a> ImageView<'a> {
    /// Create a new view after validating that the buffer size matches the
    /// dimensions and stride.
    pub fn new(data: &'a [u8], width: usize, height: usize, stride: usize) -> Result<Self, Error> {
        if stride < width {
            return Err(Error::InvalidFrame(format!(
                "stride ({stride}) cannot be less than width ({width})"
            )));
        }
        let required = if height > 0 {
            (height - 1) * stride + width
        } else {
            0
        };
        if data.len() < required {
            return Err(Error::InvalidFrame(format!(
                "buffer size ({}) too small for {width}x{height} image with stride {stride} (required: {required})",
                data.len()
            )));
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// Safe accessor for a specific row.
    #[inline(always)]
    pub fn row(&self, y: usize) -> &[u8] {
        assert!(y < self.height, "row index {y} out of bounds");
        let start = y * self.stride;
        &self.data[start..start + self.width]
    }

    /// Safe accessor for a specific pixel.
    #[inline(always)]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        assert!(x < self.width, "column index {x} out of bounds");
        self.row(y)[x]
    }

    /// Bilinear sample with clamp-to-edge addressing. Out-of-bounds
    /// coordinates return `fill`.
    pub fn sample_bilinear(&self, x: f64, y: f64, fill: u8) -> u8 {
        if x < 0.0 || y < 0.0 || x > (self.width - 1) as f64 || y > (self.height - 1) as f64 {
            return fill;
        }
        let x0 = x.floor() as usize;
        let y0 = y.floor() as usize;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);
        let fx = x - x0 as f64;
        let fy = y - y0 as f64;

        let p00 = f64::from(self.get(x0, y0));
        let p10 = f64::from(self.get(x1, y0));
        let p01 = f64::from(self.get(x0, y1));
        let p11 = f64::from(self.get(x1, y1));

        let top = p00 + (p10 - p00) * fx;
        let bot = p01 + (p11 - p01) * fx;
        (top + (bot - top) * fy).round().clamp(0.0, 255.0) as u8
    }
}

/// An owned, densely packed grayscale buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayBuf {
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
    /// Row-major pixel data, `width * height` bytes.
    pub data: Vec<u8>,
}

impl GrayBuf {
    /// Allocate a buffer filled with a constant value.
    #[must_use]
    pub fn filled(width: usize, height: usize, value: u8) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Wrap an existing row-major buffer.
    ///
    /// # Panics
    /// Panics if `data.len() != width * height`.
    #[must_use]
    pub fn from_raw(width: usize, height: usize, data: Vec<u8>) -> Self {
        assert_eq!(data.len(), width * height, "buffer size mismatch");
        Self {
            width,
            height,
            data,
        }
    }

    /// Borrow as an [`ImageView`].
    #[must_use]
    pub fn view(&self) -> ImageView<'_> {
        ImageView {
            data: &self.data,
            width: self.width,
            height: self.height,
            stride: self.width,
        }
    }

    /// Pixel accessor.
    #[inline(always)]
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    /// Pixel mutator.
    #[inline(always)]
    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        self.data[y * self.width + x] = value;
    }

    /// Return a copy rotated 90 degrees clockwise.
    #[must_use]
    pub fn rot90(&self) -> Self {
        let (w, h) = (self.width, self.height);
        let mut out = Self::filled(h, w, 0);
        for y in 0..w {
            for x in 0..h {
                out.data[y * h + x] = self.data[(h - 1 - x) * w + y];
            }
        }
        out
    }

    /// Return a copy with inverted intensities (255 - v).
    #[must_use]
    pub fn inverted(&self) -> Self {
        Self {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(|&v| 255 - v).collect(),
        }
    }

    /// Bilinear resize to the given dimensions.
    #[must_use]
    pub fn resize(&self, new_width: usize, new_height: usize) -> Self {
        if new_width == self.width && new_height == self.height {
            return self.clone();
        }
        let mut out = Self::filled(new_width, new_height, 0);
        let view = self.view();
        let sx = self.width as f64 / new_width as f64;
        let sy = self.height as f64 / new_height as f64;
        for y in 0..new_height {
            for x in 0..new_width {
                // Pixel-center mapping keeps the resize symmetric under
                // 90-degree rotations of square inputs.
                let src_x = ((x as f64 + 0.5) * sx - 0.5).clamp(0.0, (self.width - 1) as f64);
                let src_y = ((y as f64 + 0.5) * sy - 0.5).clamp(0.0, (self.height - 1) as f64);
                out.data[y * new_width + x] = view.sample_bilinear(src_x, src_y, 255);
            }
        }
        out
    }

    /// Copy out a sub-rectangle. The rectangle must lie inside the buffer.
    #[must_use]
    pub fn crop(&self, x0: usize, y0: usize, w: usize, h: usize) -> Self {
        assert!(x0 + w <= self.width && y0 + h <= self.height);
        let mut data = Vec::with_capacity(w * h);
        for y in y0..y0 + h {
            data.extend_from_slice(&self.data[y * self.width + x0..y * self.width + x0 + w]);
        }
        Self::from_raw(w, h, data)
    }

    /// Convert to an `image::GrayImage` for I/O.
    #[must_use]
    pub fn to_gray_image(&self) -> image::GrayImage {
        image::GrayImage::from_raw(self.width as u32, self.height as u32, self.data.clone())
            .unwrap_or_else(|| image::GrayImage::new(0, 0))
    }

    /// Build from an `image::GrayImage`.
    #[must_use]
    pub fn from_gray_image(img: &image::GrayImage) -> Self {
        Self {
            width: img.width() as usize,
            height: img.height() as usize,
            data: img.as_raw().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_view_stride() {
        let data = vec![
            1, 2, 3, 0, // row 0 + padding
            4, 5, 6, 0, // row 1 + padding
        ];
        let view = ImageView::new(&data, 3, 2, 4).unwrap();
        assert_eq!(view.row(0), &[1, 2, 3]);
        assert_eq!(view.row(1), &[4, 5, 6]);
        assert_eq!(view.get(1, 1), 5);
    }

    #[test]
    fn test_invalid_buffer_size() {
        let data = vec![1, 2, 3];
        assert!(ImageView::new(&data, 2, 2, 2).is_err());
    }

    #[test]
    fn test_rot90_clockwise() {
        // 2x3:
        // 1 2
        // 3 4
        // 5 6
        let buf = GrayBuf::from_raw(2, 3, vec![1, 2, 3, 4, 5, 6]);
        let rot = buf.rot90();
        // 3x2 after clockwise rotation:
        // 5 3 1
        // 6 4 2
        assert_eq!(rot.width, 3);
        assert_eq!(rot.height, 2);
        assert_eq!(rot.data, vec![5, 3, 1, 6, 4, 2]);
    }

    #[test]
    fn test_rot90_four_times_is_identity() {
        let buf = GrayBuf::from_raw(3, 3, (0..9).collect());
        let back = buf.rot90().rot90().rot90().rot90();
        assert_eq!(buf, back);
    }

    #[test]
    fn test_sample_bilinear_fill() {
        let buf = GrayBuf::filled(4, 4, 100);
        let view = buf.view();
        assert_eq!(view.sample_bilinear(-1.0, 0.0, 255), 255);
        assert_eq!(view.sample_bilinear(1.5, 1.5, 255), 100);
    }

    #[test]
    fn test_resize_identity() {
        let buf = GrayBuf::from_raw(2, 2, vec![0, 50, 100, 150]);
        assert_eq!(buf.resize(2, 2), buf);
    }
}
