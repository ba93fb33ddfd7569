//! Edge-map extraction: Sobel gradients, directional non-maximum
//! suppression, double-threshold hysteresis and binary dilation.
//!
//! The output mask is the input to contour tracing; dilation closes the
//! small gaps that tile engravings and uneven lighting leave in the edge
//! response.

use crate::image::{GrayBuf, ImageView};
use multiversion::multiversion;
use rayon::prelude::*;

// Sobel kernels:
//  Gx:            Gy:
//  -1  0  1       -1 -2 -1
//  -2  0  2        0  0  0
//  -1  0  1        1  2  1

/// Per-pixel gradient magnitude (L1) and orientation quantized to 4 bins
/// of 45 degrees.
struct Gradient {
    mag: Vec<i32>,
    dir4: Vec<u8>,
}

#[multiversion(targets(
    "x86_64+avx2+bmi1+bmi2+popcnt+lzcnt",
    "x86_64+avx512f+avx512bw+avx512dq+avx512vl",
    "aarch64+neon"
))]
fn sobel(img: &ImageView) -> Gradient {
    let w = img.width;
    let h = img.height;
    let mut mag = vec![0i32; w * h];
    let mut dir4 = vec![0u8; w * h];

    mag.par_chunks_mut(w)
        .zip(dir4.par_chunks_mut(w))
        .enumerate()
        .for_each(|(y, (mag_row, dir_row))| {
            let r0 = img.row(y.saturating_sub(1));
            let r1 = img.row(y);
            let r2 = img.row((y + 1).min(h - 1));

            for x in 0..w {
                let x0 = x.saturating_sub(1);
                let x2 = (x + 1).min(w - 1);

                let p00 = i32::from(r0[x0]);
                let p01 = i32::from(r0[x]);
                let p02 = i32::from(r0[x2]);
                let p10 = i32::from(r1[x0]);
                let p12 = i32::from(r1[x2]);
                let p20 = i32::from(r2[x0]);
                let p21 = i32::from(r2[x]);
                let p22 = i32::from(r2[x2]);

                let gx = -p00 + p02 - 2 * p10 + 2 * p12 - p20 + p22;
                let gy = -p00 - 2 * p01 - p02 + p20 + 2 * p21 + p22;

                mag_row[x] = gx.abs() + gy.abs();

                // Fold the gradient angle into [0, 180) and quantize into
                // 4 bins of 45 degrees centered on 0/45/90/135.
                let angle = (gy as f32).atan2(gx as f32).to_degrees();
                let folded = if angle < 0.0 { angle + 180.0 } else { angle };
                dir_row[x] = (((folded + 22.5) / 45.0) as u8) & 3;
            }
        });

    Gradient { mag, dir4 }
}

/// Canny-style edge mask: Sobel magnitude, non-maximum suppression along
/// the gradient direction, then hysteresis between `low` and `high`
/// thresholds. Edge pixels are 255, background 0.
#[must_use]
pub fn edge_mask(img: &ImageView, low: u8, high: u8) -> GrayBuf {
    let w = img.width;
    let h = img.height;
    if w == 0 || h == 0 {
        return GrayBuf::filled(w, h, 0);
    }
    let grad = sobel(img);
    let low = i32::from(low);
    let high = i32::from(high);

    // Offsets along the gradient direction per orientation bin.
    const STEP: [(i64, i64); 4] = [(1, 0), (1, 1), (0, 1), (-1, 1)];

    // 0 = suppressed, 1 = weak, 2 = strong
    let mut class = vec![0u8; w * h];
    class
        .par_chunks_mut(w)
        .enumerate()
        .for_each(|(y, class_row)| {
            for x in 0..w {
                let idx = y * w + x;
                let m = grad.mag[idx];
                if m < low {
                    continue;
                }
                let (dx, dy) = STEP[grad.dir4[idx] as usize];
                let fwd = neighbor_mag(&grad.mag, w, h, x as i64 + dx, y as i64 + dy);
                let bwd = neighbor_mag(&grad.mag, w, h, x as i64 - dx, y as i64 - dy);
                if m < fwd || m < bwd {
                    continue;
                }
                class_row[x] = if m >= high { 2 } else { 1 };
            }
        });

    // Hysteresis: strong pixels seed a flood through 8-connected weak
    // pixels. Scan order is row-major, so the result is deterministic.
    let mut mask = GrayBuf::filled(w, h, 0);
    let mut stack: Vec<usize> = Vec::new();
    for idx in 0..w * h {
        if class[idx] != 2 || mask.data[idx] != 0 {
            continue;
        }
        mask.data[idx] = 255;
        stack.push(idx);
        while let Some(cur) = stack.pop() {
            let cx = (cur % w) as i64;
            let cy = (cur / w) as i64;
            for dy in -1..=1i64 {
                for dx in -1..=1i64 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let nx = cx + dx;
                    let ny = cy + dy;
                    if nx < 0 || ny < 0 || nx >= w as i64 || ny >= h as i64 {
                        continue;
                    }
                    let nidx = ny as usize * w + nx as usize;
                    if class[nidx] != 0 && mask.data[nidx] == 0 {
                        mask.data[nidx] = 255;
                        stack.push(nidx);
                    }
                }
            }
        }
    }
    mask
}

#[inline]
fn neighbor_mag(mag: &[i32], w: usize, h: usize, x: i64, y: i64) -> i32 {
    if x < 0 || y < 0 || x >= w as i64 || y >= h as i64 {
        0
    } else {
        mag[y as usize * w + x as usize]
    }
}

/// Binary 3x3 dilation, repeated `iterations` times. Closes gaps in the
/// edge response before contour tracing.
#[must_use]
pub fn dilate(mask: &GrayBuf, iterations: usize) -> GrayBuf {
    let w = mask.width;
    let h = mask.height;
    if w == 0 || h == 0 {
        return mask.clone();
    }
    let mut cur = mask.clone();
    for _ in 0..iterations {
        let src = cur.data.clone();
        cur.data
            .par_chunks_mut(w)
            .enumerate()
            .for_each(|(y, dst_row)| {
                let y0 = y.saturating_sub(1);
                let y1 = (y + 1).min(h.saturating_sub(1));
                for (x, out) in dst_row.iter_mut().enumerate() {
                    if *out != 0 {
                        continue;
                    }
                    let x0 = x.saturating_sub(1);
                    let x1 = (x + 1).min(w - 1);
                    'scan: for ny in y0..=y1 {
                        for nx in x0..=x1 {
                            if src[ny * w + nx] != 0 {
                                *out = 255;
                                break 'scan;
                            }
                        }
                    }
                }
            });
    }
    cur
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageView;

    fn square_frame(size: usize, x0: usize, y0: usize, side: usize) -> Vec<u8> {
        let mut data = vec![230u8; size * size];
        for y in y0..y0 + side {
            for x in x0..x0 + side {
                data[y * size + x] = 40;
            }
        }
        data
    }

    #[test]
    fn test_uniform_frame_has_no_edges() {
        let data = vec![128u8; 64 * 64];
        let img = ImageView::new(&data, 64, 64, 64).unwrap();
        let mask = edge_mask(&img, 20, 75);
        assert!(mask.data.iter().all(|&p| p == 0));
    }

    #[test]
    fn test_square_produces_edge_ring() {
        let data = square_frame(64, 16, 16, 24);
        let img = ImageView::new(&data, 64, 64, 64).unwrap();
        let mask = edge_mask(&img, 20, 75);
        // Edges near the square border, none deep inside it
        let on: usize = mask.data.iter().filter(|&&p| p != 0).count();
        assert!(on > 40, "expected a ring of edge pixels, got {on}");
        assert_eq!(mask.get(28, 28), 0, "interior should be edge-free");
        assert_eq!(mask.get(4, 4), 0, "background should be edge-free");
    }

    #[test]
    fn test_dilate_grows_mask() {
        let mut mask = GrayBuf::filled(9, 9, 0);
        mask.set(4, 4, 255);
        let grown = dilate(&mask, 1);
        let on: usize = grown.data.iter().filter(|&&p| p != 0).count();
        assert_eq!(on, 9);
        let grown2 = dilate(&mask, 2);
        let on2: usize = grown2.data.iter().filter(|&&p| p != 0).count();
        assert_eq!(on2, 25);
    }

    #[test]
    fn test_dilate_closes_single_pixel_gap() {
        let mut mask = GrayBuf::filled(9, 3, 0);
        mask.set(2, 1, 255);
        mask.set(4, 1, 255); // gap at x=3
        let grown = dilate(&mask, 1);
        assert_eq!(grown.get(3, 1), 255);
    }
}
