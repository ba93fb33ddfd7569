//! Tile detection: edge/contour analysis with geometric filtering and
//! greedy non-max suppression.

use crate::config::PipelineConfig;
use crate::contour;
use crate::edges;
use crate::filter;
use crate::geom::{min_area_rect, OrientedBox};
use crate::image::{GrayBuf, ImageView};
use bumpalo::Bump;
use rayon::prelude::*;

/// Finds candidate tile regions in a grayscale frame.
///
/// Deterministic given identical pixel input: the contour scan is
/// row-major and suppression ties are broken by (area, center y, center x).
pub struct TileDetector {
    config: PipelineConfig,
}

impl TileDetector {
    /// Create a detector with the given configuration.
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Detect tile-shaped regions. An edge-free frame yields an empty
    /// list; the caller owns any judgment about expected tile counts.
    pub fn detect(&self, img: &ImageView) -> Vec<OrientedBox> {
        let _span = tracing::info_span!("detect_tiles").entered();

        let mut blurred = vec![0u8; img.width * img.height];
        filter::gaussian_blur(img, &mut blurred);
        let blurred_view = ImageView {
            data: &blurred,
            width: img.width,
            height: img.height,
            stride: img.width,
        };

        let mask = edges::edge_mask(&blurred_view, self.config.edge_low, self.config.edge_high);
        let closed = edges::dilate(&mask, self.config.dilate_iterations);

        let candidates = self.extract_candidates(&closed);
        self.suppress_overlaps(candidates)
    }

    /// Contour extraction plus the geometric filter cascade.
    fn extract_candidates(&self, mask: &GrayBuf) -> Vec<OrientedBox> {
        let arena = Bump::new();
        let contours = contour::find_contours(&arena, mask);

        contours
            .par_iter()
            .filter_map(|cnt| {
                let arena = Bump::new();

                let area = contour::polygon_area(cnt);
                if area < self.config.min_tile_area || area > self.config.max_tile_area {
                    return None;
                }

                let perimeter = contour::arc_length(cnt);
                let poly =
                    contour::approx_polygon(&arena, cnt, self.config.approx_epsilon * perimeter);
                if poly.len() < 4 || poly.len() > 8 {
                    return None;
                }

                let rect = min_area_rect(cnt)?;
                let aspect = rect.w.max(rect.h) / (rect.w.min(rect.h) + 1e-5);
                if aspect > self.config.max_aspect_ratio {
                    return None;
                }

                Some(rect)
            })
            .collect()
    }

    /// Greedy non-max suppression: largest boxes first, a candidate is
    /// kept only when its center is farther than
    /// `nms_center_factor * its own shorter side` from every kept center.
    fn suppress_overlaps(&self, mut candidates: Vec<OrientedBox>) -> Vec<OrientedBox> {
        candidates.sort_by(|a, b| {
            b.area()
                .partial_cmp(&a.area())
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.cy.partial_cmp(&b.cy).unwrap_or(std::cmp::Ordering::Equal))
                .then(a.cx.partial_cmp(&b.cx).unwrap_or(std::cmp::Ordering::Equal))
        });

        let mut kept: Vec<OrientedBox> = Vec::new();
        for cand in candidates {
            let radius = cand.short_side() * self.config.nms_center_factor;
            let too_close = kept.iter().any(|k| cand.center_distance(k) < radius);
            if !too_close {
                kept.push(cand);
            }
        }
        kept
    }
}
