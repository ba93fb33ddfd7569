//! Perspective-correcting crop extraction and blank-tile classification.

use crate::config::PipelineConfig;
use crate::geom::{order_corners, Homography, OrientedBox};
use crate::image::{GrayBuf, ImageView};

/// A fixed-size rectified grayscale crop of one tile, plus its blank
/// classification. Owned by the pipeline invocation that created it and
/// never mutated afterwards.
#[derive(Clone, Debug)]
pub struct TileCrop {
    /// Normalized pixels, `crop_size` x `crop_size`.
    pub pixels: GrayBuf,
    /// True when the center window carries too little ink to be a letter.
    pub blank: bool,
    /// True when the source geometry was degenerate and the crop is a
    /// uniform white placeholder. Placeholder crops are reported unknown
    /// rather than blank.
    pub degenerate: bool,
}

/// Warps oriented boxes into upright, fixed-size grayscale crops.
pub struct Rectifier {
    config: PipelineConfig,
}

impl Rectifier {
    /// Create a rectifier with the given configuration.
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Rectify one oriented box against a frame.
    ///
    /// Degenerate inputs (non-positive box dimensions, singular
    /// transforms) never panic or error; they produce a uniform white
    /// placeholder crop of the configured size.
    #[must_use]
    pub fn rectify(&self, img: &ImageView, bx: &OrientedBox) -> TileCrop {
        match self.warp(img, bx) {
            Some(warped) => self.finish(warped),
            None => self.placeholder(),
        }
    }

    /// Blank check alone, for callers that only need the flag (e.g. the
    /// word-region path).
    #[must_use]
    pub fn is_blank(&self, img: &ImageView, bx: &OrientedBox) -> bool {
        self.rectify(img, bx).blank
    }

    fn warp(&self, img: &ImageView, bx: &OrientedBox) -> Option<GrayBuf> {
        if !(bx.w > 0.0 && bx.h > 0.0) {
            return None;
        }

        let pad = self.config.crop_pad as f64;
        let size = (bx.w.max(bx.h).round() as usize) + 2 * self.config.crop_pad;
        if size == 0 || size > 4 * img.width.max(img.height).max(1) {
            return None;
        }

        // Corners outside the frame are clamped rather than rejected, so
        // partially occluded edge tiles still produce a usable crop.
        let mut corners = bx.corner_points();
        for c in &mut corners {
            c.x = c.x.clamp(0.0, (img.width.saturating_sub(1)) as f64);
            c.y = c.y.clamp(0.0, (img.height.saturating_sub(1)) as f64);
        }
        let ordered = order_corners(corners);
        let src = [
            [ordered[0].x, ordered[0].y],
            [ordered[1].x, ordered[1].y],
            [ordered[2].x, ordered[2].y],
            [ordered[3].x, ordered[3].y],
        ];
        let s = size as f64;
        let dst = [
            [pad, pad],
            [s - pad, pad],
            [s - pad, s - pad],
            [pad, s - pad],
        ];

        // Solve the inverse mapping (output -> source) directly and pull
        // pixels through it.
        let h = Homography::from_pairs(&dst, &src)?;
        let mut warped = GrayBuf::filled(size, size, 255);
        for y in 0..size {
            for x in 0..size {
                let p = h.project([x as f64, y as f64]);
                warped.data[y * size + x] = img.sample_bilinear(p[0], p[1], 255);
            }
        }
        Some(warped)
    }

    fn finish(&self, warped: GrayBuf) -> TileCrop {
        let size = warped.width;
        let margin = (size as f64 * self.config.crop_margin) as usize;
        let inner = if 2 * margin >= size {
            warped
        } else {
            warped.crop(margin, margin, size - 2 * margin, size - 2 * margin)
        };

        let inner = inner.resize(self.config.crop_inner_size, self.config.crop_inner_size);

        // White border so a glyph is never clipped at the crop boundary.
        let border = self.config.crop_border;
        let out_size = self.config.crop_size();
        let mut pixels = GrayBuf::filled(out_size, out_size, 255);
        for y in 0..inner.height {
            let dst0 = (y + border) * out_size + border;
            pixels.data[dst0..dst0 + inner.width]
                .copy_from_slice(&inner.data[y * inner.width..(y + 1) * inner.width]);
        }

        let blank = self.center_ink_fraction(&pixels) < self.config.blank_min_ink;
        TileCrop {
            pixels,
            blank,
            degenerate: false,
        }
    }

    /// Ink fraction over the center 50% window only; border and lighting
    /// artifacts near the tile edge must not flip the blank decision.
    fn center_ink_fraction(&self, crop: &GrayBuf) -> f64 {
        let (w, h) = (crop.width, crop.height);
        let (x0, x1) = (w / 4, 3 * w / 4);
        let (y0, y1) = (h / 4, 3 * h / 4);
        let mut dark = 0usize;
        let mut total = 0usize;
        for y in y0..y1 {
            for x in x0..x1 {
                total += 1;
                if crop.get(x, y) < self.config.ink_threshold {
                    dark += 1;
                }
            }
        }
        if total == 0 {
            0.0
        } else {
            dark as f64 / total as f64
        }
    }

    fn placeholder(&self) -> TileCrop {
        let size = self.config.crop_size();
        TileCrop {
            pixels: GrayBuf::filled(size, size, 255),
            blank: false,
            degenerate: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{draw_tile, TileSpec};

    fn rectifier() -> Rectifier {
        Rectifier::new(PipelineConfig::default())
    }

    #[test]
    fn test_output_size_regardless_of_rotation() {
        let mut canvas = GrayBuf::filled(400, 400, 235);
        draw_tile(
            &mut canvas,
            &TileSpec {
                cx: 200.0,
                cy: 200.0,
                side: 120.0,
                angle_deg: 0.0,
                letter: Some('A'),
            },
        );
        let r = rectifier();
        for angle in [0.0, 17.0, 45.0, 90.0, 133.0] {
            let bx = OrientedBox {
                cx: 200.0,
                cy: 200.0,
                w: 120.0,
                h: 120.0,
                angle_deg: angle,
            };
            let crop = r.rectify(&canvas.view(), &bx);
            assert_eq!(crop.pixels.width, 128);
            assert_eq!(crop.pixels.height, 128);
            assert!(!crop.degenerate);
        }
    }

    #[test]
    fn test_degenerate_box_yields_white_placeholder() {
        let canvas = GrayBuf::filled(100, 100, 200);
        let r = rectifier();
        for bx in [
            OrientedBox::axis_aligned(50.0, 50.0, 0.0, 10.0),
            OrientedBox::axis_aligned(50.0, 50.0, -5.0, 10.0),
            OrientedBox::axis_aligned(50.0, 50.0, f64::NAN, 10.0),
        ] {
            let crop = r.rectify(&canvas.view(), &bx);
            assert_eq!(crop.pixels.width, 128);
            assert!(crop.degenerate);
            assert!(!crop.blank, "placeholders fall through to the recognizer");
            assert!(crop.pixels.data.iter().all(|&p| p == 255));
        }
    }

    #[test]
    fn test_out_of_bounds_corners_are_clamped() {
        let canvas = GrayBuf::filled(100, 100, 200);
        let bx = OrientedBox::axis_aligned(5.0, 5.0, 60.0, 60.0);
        let crop = rectifier().rectify(&canvas.view(), &bx);
        assert!(!crop.degenerate);
        assert_eq!(crop.pixels.width, 128);
    }

    #[test]
    fn test_blank_tile_is_marked_blank() {
        let mut canvas = GrayBuf::filled(400, 400, 235);
        draw_tile(
            &mut canvas,
            &TileSpec {
                cx: 200.0,
                cy: 200.0,
                side: 120.0,
                angle_deg: 0.0,
                letter: None,
            },
        );
        let bx = OrientedBox::axis_aligned(200.0, 200.0, 120.0, 120.0);
        let crop = rectifier().rectify(&canvas.view(), &bx);
        assert!(crop.blank);
    }

    #[test]
    fn test_lettered_tile_is_not_blank() {
        let mut canvas = GrayBuf::filled(400, 400, 235);
        draw_tile(
            &mut canvas,
            &TileSpec {
                cx: 200.0,
                cy: 200.0,
                side: 120.0,
                angle_deg: 0.0,
                letter: Some('E'),
            },
        );
        let bx = OrientedBox::axis_aligned(200.0, 200.0, 120.0, 120.0);
        let crop = rectifier().rectify(&canvas.view(), &bx);
        assert!(!crop.blank);
    }

    #[test]
    fn test_uniform_white_center_is_always_blank() {
        let r = rectifier();
        let crop = TileCrop {
            pixels: GrayBuf::filled(128, 128, 255),
            blank: false,
            degenerate: false,
        };
        assert_eq!(r.center_ink_fraction(&crop.pixels), 0.0);
    }
}
