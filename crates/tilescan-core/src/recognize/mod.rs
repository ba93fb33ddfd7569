//! Letter recognition strategies.
//!
//! Recognition is polymorphic over [`LetterRecognizer`]; the pipeline
//! binds exactly one implementation at construction time via
//! [`bind_recognizer`], which probes the configured backends in a fixed
//! preference order: trained classifier, then template gallery, then OCR.
//! The most data-driven backend available wins. When none is available
//! the pipeline degrades to reporting every crop unknown; that is a
//! status, not an error.

/// Shared crop/template normalization.
pub mod normalize;
/// Template-gallery matching strategy.
pub mod template;

/// Trained-classifier strategy (ONNX Runtime).
#[cfg(feature = "onnx")]
pub mod classifier;

/// Tesseract OCR fallback strategy.
#[cfg(feature = "ocr")]
pub mod ocr;

use crate::config::PipelineConfig;
use crate::error::Error;
use crate::rectify::TileCrop;

pub use template::TemplateStrategy;

#[cfg(feature = "onnx")]
pub use classifier::OnnxStrategy;

#[cfg(feature = "ocr")]
pub use ocr::TesseractStrategy;

/// One classification outcome: the recognized uppercase letter (if any)
/// and a confidence on the 0..100 scale. Confidence is only meaningful
/// when a letter is present.
pub type LetterGuess = (Option<char>, f32);

/// A batch letter classifier over rectified tile crops.
///
/// Implementations hold only read-only state after construction and must
/// be safe to share across the pipeline's worker threads.
pub trait LetterRecognizer: Send + Sync {
    /// Short backend name for logs and diagnostics.
    fn name(&self) -> &str;

    /// Classify a batch of crops, one guess per crop in input order.
    /// Batching amortizes per-call backend overhead; implementations must
    /// not reorder results.
    fn classify_batch(&self, crops: &[TileCrop]) -> Vec<LetterGuess>;
}

/// Probe the configured backends and bind the first available one.
///
/// Probe order: trained classifier, template gallery, OCR. A configured
/// artifact that is simply absent moves the probe along; an artifact that
/// is present but unloadable is an error, surfaced before any frame is
/// processed. `Ok(None)` means no backend is available and the caller
/// should run in all-unknown mode.
pub fn bind_recognizer(
    config: &PipelineConfig,
) -> Result<Option<Box<dyn LetterRecognizer>>, Error> {
    if let Some(path) = &config.model_path {
        #[cfg(feature = "onnx")]
        {
            if path.is_file() {
                let strategy = classifier::OnnxStrategy::load(path, config)?;
                tracing::info!(backend = strategy.name(), model = %path.display(), "recognizer bound");
                return Ok(Some(Box::new(strategy)));
            }
            tracing::debug!(model = %path.display(), "classifier artifact not found, probing next backend");
        }
        #[cfg(not(feature = "onnx"))]
        tracing::warn!(
            model = %path.display(),
            "classifier configured but the onnx feature is compiled out"
        );
    }

    if let Some(dir) = &config.template_dir {
        let strategy = template::TemplateStrategy::load(dir, config)?;
        if strategy.is_empty() {
            tracing::debug!(gallery = %dir.display(), "template gallery empty, probing next backend");
        } else {
            tracing::info!(
                backend = strategy.name(),
                templates = strategy.len(),
                "recognizer bound"
            );
            return Ok(Some(Box::new(strategy)));
        }
    }

    #[cfg(feature = "ocr")]
    if let Some(strategy) = ocr::TesseractStrategy::probe(config) {
        tracing::info!(backend = strategy.name(), "recognizer bound");
        return Ok(Some(Box::new(strategy)));
    }

    Ok(None)
}
