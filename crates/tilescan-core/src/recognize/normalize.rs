//! Shared normalization for template matching.
//!
//! Crops and gallery templates must pass through the identical pipeline:
//! center region-of-interest, resize, binarize with a dark-letter
//! convention, and centroid recentering. The function is a fixed point on
//! its own outputs: inputs already at the match size skip the ROI/resize
//! stage, binarizing a binary image is the identity, and the recentering
//! shift is integral and only applied beyond half a pixel.

use crate::image::GrayBuf;
use crate::threshold;

/// Normalize an image for matching: ROI crop to the center fraction,
/// resize to `size`, Otsu binarize enforcing letter=dark / background=
/// light, then shift so the letter mass is centered.
///
/// A uniform input has no separating threshold and normalizes to an
/// all-background (white) image.
#[must_use]
pub fn normalize_for_match(img: &GrayBuf, size: usize, roi_frac: f64) -> GrayBuf {
    let work = if img.width == size && img.height == size {
        img.clone()
    } else {
        letter_roi(img, roi_frac).resize(size, size)
    };

    let binary = match threshold::otsu_level(&threshold::histogram(&work)) {
        Some(level) => {
            let b = threshold::binarize(&work, level);
            // Letters are a minority of the pixels; if most came out dark
            // the source polarity was inverted.
            if mean(&b) < 127.0 {
                b.inverted()
            } else {
                b
            }
        }
        None => GrayBuf::filled(size, size, 255),
    };

    center_letter(&binary)
}

/// Center crop isolating the glyph and discarding tile-edge residue.
fn letter_roi(img: &GrayBuf, center_frac: f64) -> GrayBuf {
    let m = ((1.0 - center_frac) / 2.0).clamp(0.0, 0.49);
    let x0 = (img.width as f64 * m) as usize;
    let y0 = (img.height as f64 * m) as usize;
    let w = img.width - 2 * x0;
    let h = img.height - 2 * y0;
    if w == 0 || h == 0 {
        return img.clone();
    }
    img.crop(x0, y0, w, h)
}

fn mean(img: &GrayBuf) -> f64 {
    if img.data.is_empty() {
        return 255.0;
    }
    let sum: u64 = img.data.iter().map(|&p| u64::from(p)).sum();
    sum as f64 / img.data.len() as f64
}

/// Shift the image so the centroid of its dark pixels lands on the
/// geometric center. The shift is integral and skipped within half a
/// pixel, which keeps already-centered images untouched.
fn center_letter(img: &GrayBuf) -> GrayBuf {
    let mut sum_x = 0.0f64;
    let mut sum_y = 0.0f64;
    let mut count = 0usize;
    for y in 0..img.height {
        for x in 0..img.width {
            if img.get(x, y) == 0 {
                sum_x += x as f64;
                sum_y += y as f64;
                count += 1;
            }
        }
    }
    if count == 0 {
        return img.clone();
    }

    let dx = (img.width as f64 - 1.0) / 2.0 - sum_x / count as f64;
    let dy = (img.height as f64 - 1.0) / 2.0 - sum_y / count as f64;
    let shift_x = if dx.abs() > 0.5 { dx.round() as i64 } else { 0 };
    let shift_y = if dy.abs() > 0.5 { dy.round() as i64 } else { 0 };
    if shift_x == 0 && shift_y == 0 {
        return img.clone();
    }
    translate(img, shift_x, shift_y)
}

fn translate(img: &GrayBuf, dx: i64, dy: i64) -> GrayBuf {
    let mut out = GrayBuf::filled(img.width, img.height, 255);
    for y in 0..img.height {
        for x in 0..img.width {
            let sx = x as i64 - dx;
            let sy = y as i64 - dy;
            if sx >= 0 && sy >= 0 && (sx as usize) < img.width && (sy as usize) < img.height {
                out.set(x, y, img.get(sx as usize, sy as usize));
            }
        }
    }
    out
}
