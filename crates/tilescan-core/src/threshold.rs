//! Global thresholding helpers.

use crate::image::GrayBuf;

/// Compute the 256-bin intensity histogram of a buffer.
#[must_use]
pub fn histogram(buf: &GrayBuf) -> [u32; 256] {
    let mut hist = [0u32; 256];
    for &p in &buf.data {
        hist[p as usize] += 1;
    }
    hist
}

/// Otsu's threshold: the level maximizing between-class variance.
///
/// Returns `None` for a uniform image, where no separating level exists.
#[must_use]
pub fn otsu_level(hist: &[u32; 256]) -> Option<u8> {
    let total: u64 = hist.iter().map(|&c| u64::from(c)).sum();
    if total == 0 {
        return None;
    }
    let sum_all: u64 = hist
        .iter()
        .enumerate()
        .map(|(v, &c)| v as u64 * u64::from(c))
        .sum();

    let mut best_level = None;
    let mut best_variance = 0.0f64;
    let mut weight_bg = 0u64;
    let mut sum_bg = 0u64;

    for level in 0..256usize {
        weight_bg += u64::from(hist[level]);
        if weight_bg == 0 {
            continue;
        }
        let weight_fg = total - weight_bg;
        if weight_fg == 0 {
            break;
        }
        sum_bg += level as u64 * u64::from(hist[level]);

        let mean_bg = sum_bg as f64 / weight_bg as f64;
        let mean_fg = (sum_all - sum_bg) as f64 / weight_fg as f64;
        let diff = mean_bg - mean_fg;
        let variance = weight_bg as f64 * weight_fg as f64 * diff * diff;

        if variance > best_variance {
            best_variance = variance;
            best_level = Some(level as u8);
        }
    }
    best_level
}

/// Binarize with the convention `value > level` maps to 255, else 0.
#[must_use]
pub fn binarize(buf: &GrayBuf, level: u8) -> GrayBuf {
    GrayBuf {
        width: buf.width,
        height: buf.height,
        data: buf
            .data
            .iter()
            .map(|&p| if p > level { 255 } else { 0 })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_otsu_bimodal() {
        let mut data = vec![30u8; 64];
        data.extend(vec![220u8; 64]);
        let buf = GrayBuf::from_raw(16, 8, data);
        let level = otsu_level(&histogram(&buf)).unwrap();
        assert!((30..220).contains(&level), "level {level} not between modes");
    }

    #[test]
    fn test_otsu_uniform_is_none() {
        let buf = GrayBuf::filled(8, 8, 128);
        assert!(otsu_level(&histogram(&buf)).is_none());
    }

    #[test]
    fn test_binarize_convention() {
        let buf = GrayBuf::from_raw(2, 1, vec![10, 200]);
        let bin = binarize(&buf, 100);
        assert_eq!(bin.data, vec![0, 255]);
    }

    #[test]
    fn test_binarize_binary_fixed_point() {
        let buf = GrayBuf::from_raw(2, 2, vec![0, 255, 255, 0]);
        let level = otsu_level(&histogram(&buf)).unwrap();
        assert_eq!(binarize(&buf, level), buf);
    }
}
