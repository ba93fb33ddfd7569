//! Core pipeline for reading letter tiles off a photographed game board.
//!
//! The pipeline turns a grayscale frame into one structured reading per
//! physical tile:
//!
//! 1. **Detection**: Gaussian smoothing, edge extraction with hysteresis,
//!    dilation, contour tracing and geometric filtering, then greedy
//!    non-max suppression over the surviving oriented boxes.
//! 2. **Rectification**: each box is perspective-warped into an upright
//!    fixed-size crop and classified blank or non-blank from the ink
//!    fraction of its center window.
//! 3. **Recognition**: non-blank crops go to the bound
//!    [`recognize::LetterRecognizer`] backend as one batch (trained
//!    classifier, template gallery, or OCR - probed in that order at
//!    construction).
//! 4. **Clustering** (separate entry point): adjacent tiles merge into
//!    word-level bounding regions.
//!
//! Frames are caller-owned read-only buffers; the camera, the training of
//! recognition artifacts, and the transport of results all live outside
//! this crate.
//!
//! # Example
//!
//! ```
//! use tilescan_core::{config::PipelineConfig, image::ImageView, TileReader};
//!
//! let reader = TileReader::new(PipelineConfig::default()).unwrap();
//!
//! // A featureless frame holds no tiles: a valid, empty result.
//! let pixels = vec![255u8; 64 * 64];
//! let frame = ImageView::new(&pixels, 64, 64, 64).unwrap();
//! let report = reader.process(&frame);
//! assert!(report.readings.is_empty());
//! ```

/// Diagnostic overlay rendering.
pub mod annotate;
/// Tile-to-word clustering.
pub mod cluster;
/// Pipeline configuration.
pub mod config;
/// Contour extraction and polygon simplification.
pub mod contour;
/// Tile detection.
pub mod detect;
/// Edge-map extraction.
pub mod edges;
/// Error types.
pub mod error;
/// Smoothing kernels.
pub mod filter;
/// Geometric primitives and the perspective transform.
pub mod geom;
/// Bitmap glyphs for overlays and synthetic scenes.
pub mod glyph;
/// Pixel buffer types.
pub mod image;
/// Letter recognition strategies.
pub mod recognize;
/// Perspective-correcting crop extraction.
pub mod rectify;
/// Synthetic board scenes for tests and benches.
pub mod test_utils;
/// Global thresholding helpers.
pub mod threshold;

use rayon::prelude::*;

pub use crate::config::{ClusterParams, PipelineConfig};
pub use crate::error::Error;
pub use crate::geom::OrientedBox;
pub use crate::image::{GrayBuf, ImageView};
pub use crate::rectify::TileCrop;

use crate::detect::TileDetector;
use crate::recognize::LetterRecognizer;
use crate::rectify::Rectifier;

/// Outcome class of one tile reading.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TileStatus {
    /// A letter was recognized with sufficient confidence.
    Recognized,
    /// The tile face carries no letter.
    Blank,
    /// The tile could not be read.
    Unknown,
}

/// One per detected tile, in detection order.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TileReading {
    /// Where the tile sits in the frame.
    pub region: OrientedBox,
    /// The recognized uppercase letter. Blank tiles never carry one.
    pub letter: Option<char>,
    /// Recognition confidence, 0..100. Only meaningful with a letter.
    pub confidence: f32,
    /// Outcome class.
    pub status: TileStatus,
}

/// Per-frame stage timings and summary counts.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameStats {
    /// Detection time in milliseconds.
    pub detect_ms: f64,
    /// Rectification time in milliseconds.
    pub rectify_ms: f64,
    /// Recognition time in milliseconds.
    pub classify_ms: f64,
    /// Total pipeline time in milliseconds.
    pub total_ms: f64,
    /// Number of detected tiles.
    pub num_tiles: usize,
    /// Tiles with a recognized letter.
    pub num_recognized: usize,
    /// Blank tiles.
    pub num_blank: usize,
    /// Unreadable tiles.
    pub num_unknown: usize,
}

/// Result of processing one frame.
#[derive(Clone, Debug)]
pub struct FrameReport {
    /// One reading per detected tile, aligned with detection order.
    pub readings: Vec<TileReading>,
    /// Stage timings and counts.
    pub stats: FrameStats,
}

/// The frame-processing pipeline. Holds the configuration and the
/// recognition backend bound at construction; all state is read-only
/// during processing, so one reader may serve frames from any thread.
pub struct TileReader {
    config: PipelineConfig,
    detector: TileDetector,
    rectifier: Rectifier,
    recognizer: Option<Box<dyn LetterRecognizer>>,
}

impl TileReader {
    /// Build a reader, probing recognition backends per the configured
    /// resource paths.
    ///
    /// # Errors
    /// Fails when a configured artifact is present but unloadable. Absent
    /// artifacts are not an error: the reader degrades to reporting every
    /// non-blank tile unknown.
    pub fn new(config: PipelineConfig) -> Result<Self, Error> {
        let recognizer = recognize::bind_recognizer(&config)?;
        if recognizer.is_none() {
            tracing::warn!(
                "no recognition backend available; all non-blank tiles will be reported unknown"
            );
        }
        Ok(Self::assemble(config, recognizer))
    }

    /// Build a reader around a caller-provided recognition backend,
    /// bypassing the probe.
    #[must_use]
    pub fn with_recognizer(config: PipelineConfig, recognizer: Box<dyn LetterRecognizer>) -> Self {
        Self::assemble(config, Some(recognizer))
    }

    fn assemble(config: PipelineConfig, recognizer: Option<Box<dyn LetterRecognizer>>) -> Self {
        Self {
            detector: TileDetector::new(config.clone()),
            rectifier: Rectifier::new(config.clone()),
            config,
            recognizer,
        }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Name of the bound recognition backend, if any.
    #[must_use]
    pub fn recognizer_name(&self) -> Option<&str> {
        self.recognizer.as_deref().map(LetterRecognizer::name)
    }

    /// Detect tile regions only.
    #[must_use]
    pub fn detect(&self, frame: &ImageView) -> Vec<OrientedBox> {
        self.detector.detect(frame)
    }

    /// Run the full pipeline over one frame.
    #[must_use]
    pub fn process(&self, frame: &ImageView) -> FrameReport {
        let start_total = std::time::Instant::now();
        let mut stats = FrameStats::default();

        let start = std::time::Instant::now();
        let boxes = self.detector.detect(frame);
        stats.detect_ms = start.elapsed().as_secs_f64() * 1000.0;
        stats.num_tiles = boxes.len();

        // Rectifications are independent; par_iter preserves input order,
        // keeping readings 1:1 with detection order.
        let start = std::time::Instant::now();
        let crops: Vec<TileCrop> = {
            let _span = tracing::info_span!("rectify_tiles").entered();
            boxes
                .par_iter()
                .map(|bx| self.rectifier.rectify(frame, bx))
                .collect()
        };
        stats.rectify_ms = start.elapsed().as_secs_f64() * 1000.0;

        // Submit readable crops as one batch; blank and placeholder crops
        // are resolved locally.
        let start = std::time::Instant::now();
        let submitted: Vec<usize> = crops
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.blank && !c.degenerate)
            .map(|(i, _)| i)
            .collect();
        let mut guesses: Vec<Option<recognize::LetterGuess>> = vec![None; crops.len()];
        if !submitted.is_empty() {
            if let Some(recognizer) = &self.recognizer {
                let _span = tracing::info_span!("classify_tiles", backend = recognizer.name())
                    .entered();
                let batch: Vec<TileCrop> =
                    submitted.iter().map(|&i| crops[i].clone()).collect();
                let results = recognizer.classify_batch(&batch);
                for (&i, guess) in submitted.iter().zip(results.into_iter()) {
                    guesses[i] = Some(guess);
                }
            }
        }
        stats.classify_ms = start.elapsed().as_secs_f64() * 1000.0;

        let readings: Vec<TileReading> = boxes
            .iter()
            .zip(crops.iter())
            .zip(guesses.into_iter())
            .map(|((bx, crop), guess)| {
                if crop.blank {
                    return TileReading {
                        region: *bx,
                        letter: None,
                        confidence: 0.0,
                        status: TileStatus::Blank,
                    };
                }
                match guess {
                    Some((Some(letter), confidence)) => TileReading {
                        region: *bx,
                        letter: Some(letter),
                        confidence,
                        status: TileStatus::Recognized,
                    },
                    _ => TileReading {
                        region: *bx,
                        letter: None,
                        confidence: 0.0,
                        status: TileStatus::Unknown,
                    },
                }
            })
            .collect();

        stats.num_recognized = readings
            .iter()
            .filter(|r| r.status == TileStatus::Recognized)
            .count();
        stats.num_blank = readings
            .iter()
            .filter(|r| r.status == TileStatus::Blank)
            .count();
        stats.num_unknown = readings
            .iter()
            .filter(|r| r.status == TileStatus::Unknown)
            .count();
        stats.total_ms = start_total.elapsed().as_secs_f64() * 1000.0;

        tracing::debug!(
            tiles = stats.num_tiles,
            recognized = stats.num_recognized,
            blank = stats.num_blank,
            unknown = stats.num_unknown,
            "frame processed"
        );

        FrameReport { readings, stats }
    }

    /// Run the full pipeline and render the diagnostic overlay.
    #[must_use]
    pub fn process_annotated(&self, frame: &ImageView) -> (FrameReport, ::image::RgbImage) {
        let report = self.process(frame);
        let overlay = annotate::annotate(frame, &report.readings);
        (report, overlay)
    }

    /// Word-level bounding regions: detected tiles minus blanks, grouped
    /// by adjacency.
    #[must_use]
    pub fn word_regions(&self, frame: &ImageView) -> Vec<OrientedBox> {
        let boxes = self.detector.detect(frame);
        let lettered: Vec<OrientedBox> = boxes
            .par_iter()
            .filter(|bx| !self.rectifier.is_blank(frame, bx))
            .copied()
            .collect();
        cluster::cluster_boxes(&lettered, &self.config.cluster)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_without_backends_reports_unknown() {
        let reader = TileReader::new(PipelineConfig::default()).unwrap();
        assert!(reader.recognizer_name().is_none());
    }

    #[test]
    fn test_empty_frame_is_a_valid_empty_report() {
        let reader = TileReader::new(PipelineConfig::default()).unwrap();
        let pixels = vec![255u8; 128 * 128];
        let frame = ImageView::new(&pixels, 128, 128, 128).unwrap();
        let report = reader.process(&frame);
        assert!(report.readings.is_empty());
        assert_eq!(report.stats.num_tiles, 0);
    }
}
