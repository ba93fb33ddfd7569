//! Smoothing kernels applied ahead of edge detection.

use crate::image::ImageView;
use multiversion::multiversion;
use rayon::prelude::*;

/// 5-tap binomial kernel, an integer approximation of a Gaussian with
/// sigma near 1.1.
const KERNEL: [u32; 5] = [1, 4, 6, 4, 1];
const KERNEL_SUM: u32 = 16;

/// Apply a separable 5x5 Gaussian blur.
///
/// Borders are handled by clamping sample coordinates to the image edge.
/// `output` must be `img.width * img.height` bytes.
#[multiversion(targets(
    "x86_64+avx2+bmi1+bmi2+popcnt+lzcnt",
    "x86_64+avx512f+avx512bw+avx512dq+avx512vl",
    "aarch64+neon"
))]
pub fn gaussian_blur(img: &ImageView, output: &mut [u8]) {
    let w = img.width;
    let h = img.height;
    assert_eq!(output.len(), w * h, "output buffer size mismatch");
    if w == 0 || h == 0 {
        return;
    }

    let mut temp = vec![0u8; w * h];

    // Pass 1: horizontal
    temp.par_chunks_mut(w).enumerate().for_each(|(y, dst_row)| {
        let src_row = img.row(y);
        for x in 0..w {
            let mut acc = 0u32;
            for (k, &weight) in KERNEL.iter().enumerate() {
                let nx = (x as i64 + k as i64 - 2).clamp(0, w as i64 - 1) as usize;
                acc += u32::from(src_row[nx]) * weight;
            }
            dst_row[x] = (acc / KERNEL_SUM) as u8;
        }
    });

    // Pass 2: vertical
    output
        .par_chunks_mut(w)
        .enumerate()
        .for_each(|(y, dst_row)| {
            for x in 0..w {
                let mut acc = 0u32;
                for (k, &weight) in KERNEL.iter().enumerate() {
                    let ny = (y as i64 + k as i64 - 2).clamp(0, h as i64 - 1) as usize;
                    acc += u32::from(temp[ny * w + x]) * weight;
                }
                dst_row[x] = (acc / KERNEL_SUM) as u8;
            }
        });
}
