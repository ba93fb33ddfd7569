//! Configuration for the tile-reading pipeline.
//!
//! All empirically tuned thresholds live here rather than as hardcoded
//! constants, and resource paths are explicit fields: there is no
//! process-wide default lookup. Defaults are calibrated for the reference
//! rig (tiles of roughly 100-200 px at the working camera distance) and
//! should be re-tuned per installation.

use std::path::PathBuf;

/// Adjacency thresholds for grouping tiles into word regions, as factors
/// of the average side length of the two boxes under test.
///
/// Too loose merges unrelated words; too tight splits letters of the same
/// word.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClusterParams {
    /// Two boxes are adjacent when their minimum corner-to-corner distance
    /// is below this factor times the average side length (default: 0.35).
    pub corner_factor: f64,
    /// Alternative adjacency gate on center-to-center distance
    /// (default: 0.42).
    pub center_factor: f64,
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            corner_factor: 0.35,
            center_factor: 0.42,
        }
    }
}

/// Pipeline-level configuration, immutable after the reader is
/// constructed. Use the builder for ergonomic construction.
///
/// # Example
/// ```
/// use tilescan_core::config::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .min_tile_area(8_000.0)
///     .max_tile_area(50_000.0)
///     .template_dir("gallery/")
///     .build();
/// assert_eq!(config.crop_size(), 128);
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PipelineConfig {
    // Detector parameters
    /// Hysteresis low threshold for the edge detector (default: 20).
    pub edge_low: u8,
    /// Hysteresis high threshold for the edge detector (default: 75).
    pub edge_high: u8,
    /// Rounds of 3x3 dilation closing gaps in the edge map (default: 3).
    pub dilate_iterations: usize,
    /// Minimum accepted contour area in square pixels (default: 10000).
    pub min_tile_area: f64,
    /// Maximum accepted contour area in square pixels (default: 40000).
    pub max_tile_area: f64,
    /// Polygon-approximation tolerance as a fraction of the contour
    /// perimeter (default: 0.06).
    pub approx_epsilon: f64,
    /// Maximum aspect ratio of the fitted rectangle; tiles are near-square
    /// (default: 1.6).
    pub max_aspect_ratio: f64,
    /// Non-max suppression radius as a factor of the accepted box's
    /// shorter side (default: 0.4).
    pub nms_center_factor: f64,

    // Rectifier parameters
    /// Padding in warped pixels around the box when computing the
    /// perspective target square (default: 6).
    pub crop_pad: usize,
    /// Fraction of the warped square trimmed from each side to discard
    /// tile-edge artifacts (default: 0.15).
    pub crop_margin: f64,
    /// Side of the resized inner region (default: 80).
    pub crop_inner_size: usize,
    /// Uniform white border added around the inner region so a glyph is
    /// never clipped at the crop boundary (default: 24).
    pub crop_border: usize,
    /// Intensity below which a pixel counts as ink (default: 140).
    pub ink_threshold: u8,
    /// Minimum ink fraction in the center window for a crop to be
    /// non-blank (default: 0.02).
    pub blank_min_ink: f64,

    // Recognizer parameters
    /// Directory holding the reference gallery (`A.png` .. `Z.png`).
    /// `None` disables the template strategy.
    pub template_dir: Option<PathBuf>,
    /// Path of the trained classifier artifact (ONNX). `None` disables the
    /// classifier strategy.
    pub model_path: Option<PathBuf>,
    /// Side of the normalized match image (default: 64).
    pub template_size: usize,
    /// Center fraction of a crop isolating the glyph before matching
    /// (default: 0.70).
    pub letter_roi: f64,
    /// Minimum correlation score on the [0, 1] scale for a template match
    /// (default: 0.45).
    pub min_match_score: f64,
    /// Minimum score margin over the second-best distinct letter; matches
    /// inside the margin are reported unknown (default: 0.05).
    pub min_match_margin: f64,
    /// Side of the classifier input image (default: 32).
    pub classifier_input_size: usize,
    /// Minimum classifier probability, in percent, to accept the arg-max
    /// class (default: 50.0).
    pub min_classifier_confidence: f64,
    /// Minimum OCR confidence, in percent, to accept a single-letter read
    /// (default: 30.0).
    pub min_ocr_confidence: f64,

    /// Tile-to-word clustering thresholds.
    pub cluster: ClusterParams,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            edge_low: 20,
            edge_high: 75,
            dilate_iterations: 3,
            min_tile_area: 10_000.0,
            max_tile_area: 40_000.0,
            approx_epsilon: 0.06,
            max_aspect_ratio: 1.6,
            nms_center_factor: 0.4,
            crop_pad: 6,
            crop_margin: 0.15,
            crop_inner_size: 80,
            crop_border: 24,
            ink_threshold: 140,
            blank_min_ink: 0.02,
            template_dir: None,
            model_path: None,
            template_size: 64,
            letter_roi: 0.70,
            min_match_score: 0.45,
            min_match_margin: 0.05,
            classifier_input_size: 32,
            min_classifier_confidence: 50.0,
            min_ocr_confidence: 30.0,
            cluster: ClusterParams::default(),
        }
    }
}

impl PipelineConfig {
    /// Create a new builder.
    #[must_use]
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Side length of the final crop: inner region plus borders.
    #[must_use]
    pub fn crop_size(&self) -> usize {
        self.crop_inner_size + 2 * self.crop_border
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Default)]
pub struct PipelineConfigBuilder {
    edge_low: Option<u8>,
    edge_high: Option<u8>,
    dilate_iterations: Option<usize>,
    min_tile_area: Option<f64>,
    max_tile_area: Option<f64>,
    approx_epsilon: Option<f64>,
    max_aspect_ratio: Option<f64>,
    nms_center_factor: Option<f64>,
    crop_pad: Option<usize>,
    crop_margin: Option<f64>,
    crop_inner_size: Option<usize>,
    crop_border: Option<usize>,
    ink_threshold: Option<u8>,
    blank_min_ink: Option<f64>,
    template_dir: Option<PathBuf>,
    model_path: Option<PathBuf>,
    template_size: Option<usize>,
    letter_roi: Option<f64>,
    min_match_score: Option<f64>,
    min_match_margin: Option<f64>,
    classifier_input_size: Option<usize>,
    min_classifier_confidence: Option<f64>,
    min_ocr_confidence: Option<f64>,
    cluster: Option<ClusterParams>,
}

impl PipelineConfigBuilder {
    /// Set the edge-detector hysteresis thresholds.
    #[must_use]
    pub fn edge_thresholds(mut self, low: u8, high: u8) -> Self {
        self.edge_low = Some(low);
        self.edge_high = Some(high);
        self
    }

    /// Set the number of dilation rounds on the edge map.
    #[must_use]
    pub fn dilate_iterations(mut self, iterations: usize) -> Self {
        self.dilate_iterations = Some(iterations);
        self
    }

    /// Set the minimum accepted contour area.
    #[must_use]
    pub fn min_tile_area(mut self, area: f64) -> Self {
        self.min_tile_area = Some(area);
        self
    }

    /// Set the maximum accepted contour area.
    #[must_use]
    pub fn max_tile_area(mut self, area: f64) -> Self {
        self.max_tile_area = Some(area);
        self
    }

    /// Set the polygon-approximation tolerance (fraction of perimeter).
    #[must_use]
    pub fn approx_epsilon(mut self, epsilon: f64) -> Self {
        self.approx_epsilon = Some(epsilon);
        self
    }

    /// Set the maximum accepted aspect ratio.
    #[must_use]
    pub fn max_aspect_ratio(mut self, ratio: f64) -> Self {
        self.max_aspect_ratio = Some(ratio);
        self
    }

    /// Set the suppression radius factor.
    #[must_use]
    pub fn nms_center_factor(mut self, factor: f64) -> Self {
        self.nms_center_factor = Some(factor);
        self
    }

    /// Set the warp padding in pixels.
    #[must_use]
    pub fn crop_pad(mut self, pad: usize) -> Self {
        self.crop_pad = Some(pad);
        self
    }

    /// Set the trimmed margin fraction.
    #[must_use]
    pub fn crop_margin(mut self, margin: f64) -> Self {
        self.crop_margin = Some(margin);
        self
    }

    /// Set the inner crop size and white border width.
    #[must_use]
    pub fn crop_geometry(mut self, inner_size: usize, border: usize) -> Self {
        self.crop_inner_size = Some(inner_size);
        self.crop_border = Some(border);
        self
    }

    /// Set the ink intensity threshold.
    #[must_use]
    pub fn ink_threshold(mut self, threshold: u8) -> Self {
        self.ink_threshold = Some(threshold);
        self
    }

    /// Set the minimum ink fraction for a non-blank crop.
    #[must_use]
    pub fn blank_min_ink(mut self, fraction: f64) -> Self {
        self.blank_min_ink = Some(fraction);
        self
    }

    /// Set the template gallery directory.
    #[must_use]
    pub fn template_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.template_dir = Some(dir.into());
        self
    }

    /// Set the trained classifier artifact path.
    #[must_use]
    pub fn model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = Some(path.into());
        self
    }

    /// Set the normalized match image size.
    #[must_use]
    pub fn template_size(mut self, size: usize) -> Self {
        self.template_size = Some(size);
        self
    }

    /// Set the glyph region-of-interest fraction.
    #[must_use]
    pub fn letter_roi(mut self, fraction: f64) -> Self {
        self.letter_roi = Some(fraction);
        self
    }

    /// Set the template acceptance floor and margin.
    #[must_use]
    pub fn match_thresholds(mut self, min_score: f64, min_margin: f64) -> Self {
        self.min_match_score = Some(min_score);
        self.min_match_margin = Some(min_margin);
        self
    }

    /// Set the classifier input size.
    #[must_use]
    pub fn classifier_input_size(mut self, size: usize) -> Self {
        self.classifier_input_size = Some(size);
        self
    }

    /// Set the minimum classifier confidence in percent.
    #[must_use]
    pub fn min_classifier_confidence(mut self, percent: f64) -> Self {
        self.min_classifier_confidence = Some(percent);
        self
    }

    /// Set the minimum OCR confidence in percent.
    #[must_use]
    pub fn min_ocr_confidence(mut self, percent: f64) -> Self {
        self.min_ocr_confidence = Some(percent);
        self
    }

    /// Set the clustering thresholds.
    #[must_use]
    pub fn cluster(mut self, params: ClusterParams) -> Self {
        self.cluster = Some(params);
        self
    }

    /// Build the configuration, using defaults for unset fields.
    #[must_use]
    pub fn build(self) -> PipelineConfig {
        let d = PipelineConfig::default();
        PipelineConfig {
            edge_low: self.edge_low.unwrap_or(d.edge_low),
            edge_high: self.edge_high.unwrap_or(d.edge_high),
            dilate_iterations: self.dilate_iterations.unwrap_or(d.dilate_iterations),
            min_tile_area: self.min_tile_area.unwrap_or(d.min_tile_area),
            max_tile_area: self.max_tile_area.unwrap_or(d.max_tile_area),
            approx_epsilon: self.approx_epsilon.unwrap_or(d.approx_epsilon),
            max_aspect_ratio: self.max_aspect_ratio.unwrap_or(d.max_aspect_ratio),
            nms_center_factor: self.nms_center_factor.unwrap_or(d.nms_center_factor),
            crop_pad: self.crop_pad.unwrap_or(d.crop_pad),
            crop_margin: self.crop_margin.unwrap_or(d.crop_margin),
            crop_inner_size: self.crop_inner_size.unwrap_or(d.crop_inner_size),
            crop_border: self.crop_border.unwrap_or(d.crop_border),
            ink_threshold: self.ink_threshold.unwrap_or(d.ink_threshold),
            blank_min_ink: self.blank_min_ink.unwrap_or(d.blank_min_ink),
            template_dir: self.template_dir.or(d.template_dir),
            model_path: self.model_path.or(d.model_path),
            template_size: self.template_size.unwrap_or(d.template_size),
            letter_roi: self.letter_roi.unwrap_or(d.letter_roi),
            min_match_score: self.min_match_score.unwrap_or(d.min_match_score),
            min_match_margin: self.min_match_margin.unwrap_or(d.min_match_margin),
            classifier_input_size: self
                .classifier_input_size
                .unwrap_or(d.classifier_input_size),
            min_classifier_confidence: self
                .min_classifier_confidence
                .unwrap_or(d.min_classifier_confidence),
            min_ocr_confidence: self.min_ocr_confidence.unwrap_or(d.min_ocr_confidence),
            cluster: self.cluster.unwrap_or(d.cluster),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides_and_defaults() {
        let config = PipelineConfig::builder()
            .edge_thresholds(10, 60)
            .min_tile_area(5_000.0)
            .build();
        assert_eq!(config.edge_low, 10);
        assert_eq!(config.edge_high, 60);
        assert_eq!(config.min_tile_area, 5_000.0);
        // Unset fields keep defaults
        assert_eq!(config.max_tile_area, 40_000.0);
        assert_eq!(config.dilate_iterations, 3);
    }

    #[test]
    fn test_crop_size() {
        let config = PipelineConfig::default();
        assert_eq!(config.crop_size(), 128);
        let custom = PipelineConfig::builder().crop_geometry(64, 8).build();
        assert_eq!(custom.crop_size(), 80);
    }

    #[test]
    fn test_no_default_resource_paths() {
        let config = PipelineConfig::default();
        assert!(config.template_dir.is_none());
        assert!(config.model_path.is_none());
    }
}
