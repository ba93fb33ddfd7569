//! General OCR fallback via Tesseract.
//!
//! Lowest-priority backend: a single-character page-segmentation pass with
//! an A-Z whitelist, run over several binarization variants and all four
//! cardinal rotations. Different letter shapes respond to different
//! variants, so the best-scoring single-alpha read wins.

use leptess::{LepTess, Variable};

use crate::config::PipelineConfig;
use crate::image::GrayBuf;
use crate::recognize::{LetterGuess, LetterRecognizer};
use crate::rectify::TileCrop;
use crate::threshold;

/// Tesseract-backed recognizer.
pub struct TesseractStrategy {
    min_confidence: f64,
}

impl TesseractStrategy {
    /// Probe for a usable Tesseract installation. Returns `None` when the
    /// engine or its language data is unavailable.
    #[must_use]
    pub fn probe(config: &PipelineConfig) -> Option<Self> {
        match LepTess::new(None, "eng") {
            Ok(_) => Some(Self {
                min_confidence: config.min_ocr_confidence,
            }),
            Err(e) => {
                tracing::debug!(error = %e, "tesseract unavailable");
                None
            }
        }
    }

    /// Preprocessing variants: raw grayscale, Otsu-binarized upscaled 3x,
    /// and stroke-thickened binarized upscaled 3x.
    fn variants(crop: &GrayBuf) -> Vec<GrayBuf> {
        let mut out = vec![crop.clone()];
        if let Some(level) = threshold::otsu_level(&threshold::histogram(crop)) {
            let binary = threshold::binarize(crop, level);
            out.push(binary.resize(binary.width * 3, binary.height * 3));
            out.push(thicken(&binary).resize(binary.width * 3, binary.height * 3));
        }
        out
    }

    fn recognize_one(&self, crop: &GrayBuf) -> LetterGuess {
        let mut best: LetterGuess = (None, -1.0);
        for variant in Self::variants(crop) {
            let mut rotated = variant;
            for k in 0..4 {
                if k > 0 {
                    rotated = rotated.rot90();
                }
                if let Some((letter, conf)) = tesseract_single_char(&rotated) {
                    if conf > best.1 {
                        best = (Some(letter), conf);
                    }
                }
            }
        }
        match best {
            (Some(letter), conf) if f64::from(conf) >= self.min_confidence => {
                (Some(letter), conf.min(100.0))
            }
            _ => (None, 0.0),
        }
    }
}

/// Thicken dark strokes with a 2x2 minimum filter; helps thin glyphs like
/// I and the tail of Q.
fn thicken(img: &GrayBuf) -> GrayBuf {
    let mut out = img.clone();
    for y in 0..img.height {
        for x in 0..img.width {
            let mut min = img.get(x, y);
            if x + 1 < img.width {
                min = min.min(img.get(x + 1, y));
            }
            if y + 1 < img.height {
                min = min.min(img.get(x, y + 1));
            }
            if x + 1 < img.width && y + 1 < img.height {
                min = min.min(img.get(x + 1, y + 1));
            }
            out.set(x, y, min);
        }
    }
    out
}

/// Run one Tesseract pass configured for a single uppercase character.
/// Returns the read letter with its mean confidence, or `None`.
fn tesseract_single_char(img: &GrayBuf) -> Option<(char, f32)> {
    let mut tess = LepTess::new(None, "eng").ok()?;
    tess.set_variable(Variable::TesseditCharWhitelist, "ABCDEFGHIJKLMNOPQRSTUVWXYZ")
        .ok()?;
    tess.set_variable(Variable::TesseditPagesegMode, "10").ok()?;

    let mut png = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut png);
    img.to_gray_image()
        .write_to(&mut cursor, image::ImageFormat::Png)
        .ok()?;
    tess.set_image_from_mem(&png).ok()?;
    tess.set_source_resolution(300);

    let text = tess.get_utf8_text().ok()?;
    let trimmed = text.trim();
    let mut chars = trimmed.chars();
    let letter = chars.next()?;
    if chars.next().is_some() || !letter.is_ascii_alphabetic() {
        return None;
    }
    let conf = tess.mean_text_conf() as f32;
    Some((letter.to_ascii_uppercase(), conf.max(0.0)))
}

impl LetterRecognizer for TesseractStrategy {
    fn name(&self) -> &'static str {
        "ocr"
    }

    fn classify_batch(&self, crops: &[TileCrop]) -> Vec<LetterGuess> {
        // Each pass owns its engine instance; Tesseract handles are not
        // safely shareable across threads.
        crops.iter().map(|c| self.recognize_one(&c.pixels)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thicken_grows_dark_regions() {
        let mut img = GrayBuf::filled(8, 8, 255);
        img.set(4, 4, 0);
        let out = thicken(&img);
        let dark = out.data.iter().filter(|&&p| p == 0).count();
        assert_eq!(dark, 4);
    }

    #[test]
    fn test_variants_include_raw_and_binarized() {
        let mut img = GrayBuf::filled(32, 32, 240);
        for x in 10..22 {
            img.set(x, 16, 20);
        }
        let variants = TesseractStrategy::variants(&img);
        assert_eq!(variants.len(), 3);
        assert_eq!(variants[0], img);
        assert_eq!(variants[1].width, 96);
    }
}
