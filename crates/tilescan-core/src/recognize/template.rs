//! Template-matching letter recognition.
//!
//! Holds one normalized reference image per letter and scores crops with
//! single-position normalized cross-correlation across the four cardinal
//! rotations and both polarities. A match must clear both an absolute
//! score floor and a margin over the second-best distinct letter; the
//! margin rule prevents the gallery's rounder glyphs from absorbing every
//! ambiguous crop.

use std::path::Path;

use rayon::prelude::*;

use crate::config::PipelineConfig;
use crate::error::Error;
use crate::image::GrayBuf;
use crate::recognize::normalize::normalize_for_match;
use crate::recognize::{LetterGuess, LetterRecognizer};
use crate::rectify::TileCrop;

/// A reference glyph with its ground-truth letter.
struct Template {
    letter: char,
    pixels: GrayBuf,
}

/// Template-gallery recognizer.
pub struct TemplateStrategy {
    templates: Vec<Template>,
    size: usize,
    roi_frac: f64,
    min_score: f64,
    min_margin: f64,
}

impl TemplateStrategy {
    /// Build a recognizer from labeled images, normalizing each the same
    /// way crops are normalized at classification time.
    #[must_use]
    pub fn from_labeled<I>(images: I, config: &PipelineConfig) -> Self
    where
        I: IntoIterator<Item = (char, GrayBuf)>,
    {
        let size = config.template_size;
        let roi = config.letter_roi;
        let templates = images
            .into_iter()
            .filter(|(letter, _)| letter.is_ascii_uppercase())
            .map(|(letter, img)| Template {
                letter,
                pixels: normalize_for_match(&img, size, roi),
            })
            .collect();
        Self {
            templates,
            size,
            roi_frac: roi,
            min_score: config.min_match_score,
            min_margin: config.min_match_margin,
        }
    }

    /// Load `A.png` through `Z.png` from a gallery directory. Missing
    /// letters are skipped; a present but undecodable image is an error,
    /// since silently dropping it would skew recognition.
    pub fn load(dir: &Path, config: &PipelineConfig) -> Result<Self, Error> {
        let mut images = Vec::new();
        for letter in 'A'..='Z' {
            let path = dir.join(format!("{letter}.png"));
            if !path.is_file() {
                continue;
            }
            let img = image::open(&path)
                .map_err(|source| Error::Gallery {
                    path: path.clone(),
                    source,
                })?
                .to_luma8();
            images.push((letter, GrayBuf::from_gray_image(&img)));
        }
        tracing::debug!(gallery = %dir.display(), count = images.len(), "loaded template gallery");
        Ok(Self::from_labeled(images, config))
    }

    /// Number of loaded templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// True when the gallery is empty and the strategy is unusable.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Single-position normalized cross-correlation mapped from [-1, 1]
    /// onto [0, 1]. Images must share dimensions. A zero-variance operand
    /// scores 0: a featureless crop matches nothing.
    fn score(a: &GrayBuf, b: &GrayBuf) -> f64 {
        debug_assert_eq!(a.data.len(), b.data.len());
        let n = a.data.len() as f64;
        let mean_a = a.data.iter().map(|&p| f64::from(p)).sum::<f64>() / n;
        let mean_b = b.data.iter().map(|&p| f64::from(p)).sum::<f64>() / n;

        let mut cross = 0.0;
        let mut var_a = 0.0;
        let mut var_b = 0.0;
        for (&pa, &pb) in a.data.iter().zip(b.data.iter()) {
            let da = f64::from(pa) - mean_a;
            let db = f64::from(pb) - mean_b;
            cross += da * db;
            var_a += da * da;
            var_b += db * db;
        }
        if var_a < 1e-9 || var_b < 1e-9 {
            return 0.0;
        }
        let ncc = cross / (var_a * var_b).sqrt();
        (ncc + 1.0) / 2.0
    }

    fn classify_one(&self, crop: &TileCrop) -> LetterGuess {
        if self.templates.is_empty() {
            return (None, 0.0);
        }
        let prep = normalize_for_match(&crop.pixels, self.size, self.roi_frac);

        // Best score per letter across rotations, polarities and every
        // template of that letter.
        let mut per_letter = [f64::NEG_INFINITY; 26];
        let mut rotated = prep;
        for k in 0..4 {
            if k > 0 {
                rotated = rotated.rot90();
            }
            for variant in [rotated.clone(), rotated.inverted()] {
                for tpl in &self.templates {
                    let s = Self::score(&variant, &tpl.pixels);
                    let idx = (tpl.letter as u8 - b'A') as usize;
                    if s > per_letter[idx] {
                        per_letter[idx] = s;
                    }
                }
            }
        }

        let mut best_letter = None;
        let mut best = f64::NEG_INFINITY;
        let mut second = f64::NEG_INFINITY;
        for (idx, &s) in per_letter.iter().enumerate() {
            if s.is_infinite() {
                continue;
            }
            if s > best {
                second = best;
                best = s;
                best_letter = Some((b'A' + idx as u8) as char);
            } else if s > second {
                second = s;
            }
        }

        let Some(letter) = best_letter else {
            return (None, 0.0);
        };
        if best < self.min_score {
            return (None, 0.0);
        }
        // Margin over the second-best distinct letter; a near-tie is
        // reported unknown rather than broken arbitrarily.
        if second.is_finite() && best - second < self.min_margin {
            return (None, 0.0);
        }
        (Some(letter), (best * 100.0).min(100.0) as f32)
    }
}

impl LetterRecognizer for TemplateStrategy {
    fn name(&self) -> &'static str {
        "template"
    }

    fn classify_batch(&self, crops: &[TileCrop]) -> Vec<LetterGuess> {
        crops.par_iter().map(|c| self.classify_one(c)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::letter_reference;

    fn gallery(letters: &[char]) -> TemplateStrategy {
        let config = PipelineConfig::default();
        TemplateStrategy::from_labeled(
            letters.iter().map(|&c| (c, letter_reference(c, 128))),
            &config,
        )
    }

    fn crop_of(letter: char) -> TileCrop {
        TileCrop {
            pixels: letter_reference(letter, 128),
            blank: false,
            degenerate: false,
        }
    }

    #[test]
    fn test_recognizes_matching_letter() {
        let strategy = gallery(&['A', 'E', 'T', 'X']);
        for letter in ['A', 'E', 'T', 'X'] {
            let (guess, conf) = strategy.classify_one(&crop_of(letter));
            assert_eq!(guess, Some(letter));
            assert!(conf > 45.0);
        }
    }

    #[test]
    fn test_rotation_invariance() {
        let strategy = gallery(&['A', 'E', 'T', 'X']);
        let base = crop_of('E');
        let mut rotated = base.pixels.clone();
        for _ in 0..3 {
            rotated = rotated.rot90();
            let crop = TileCrop {
                pixels: rotated.clone(),
                blank: false,
                degenerate: false,
            };
            let (guess, _) = strategy.classify_one(&crop);
            assert_eq!(guess, Some('E'));
        }
    }

    #[test]
    fn test_polarity_invariance() {
        let strategy = gallery(&['A', 'T']);
        let crop = TileCrop {
            pixels: letter_reference('T', 128).inverted(),
            blank: false,
            degenerate: false,
        };
        let (guess, _) = strategy.classify_one(&crop);
        assert_eq!(guess, Some('T'));
    }

    #[test]
    fn test_blank_crop_is_unknown() {
        let strategy = gallery(&['A', 'O']);
        let crop = TileCrop {
            pixels: GrayBuf::filled(128, 128, 255),
            blank: false,
            degenerate: false,
        };
        let (guess, conf) = strategy.classify_one(&crop);
        assert_eq!(guess, None);
        assert_eq!(conf, 0.0);
    }

    #[test]
    fn test_margin_rule_rejects_near_ties() {
        // Two labels carrying the same glyph pattern force an exact tie:
        // whatever wins, the runner-up is within any positive margin.
        let config = PipelineConfig::default();
        let strategy = TemplateStrategy::from_labeled(
            [
                ('B', letter_reference('B', 128)),
                ('D', letter_reference('B', 128)),
            ],
            &config,
        );
        let crop = crop_of('B');
        let (guess, _) = strategy.classify_one(&crop);
        assert_eq!(guess, None, "a tie must be unknown, not an arbitrary pick");
    }

    #[test]
    fn test_empty_gallery_reports_unknown() {
        let strategy = gallery(&[]);
        assert!(strategy.is_empty());
        let out = strategy.classify_batch(&[crop_of('A')]);
        assert_eq!(out, vec![(None, 0.0)]);
    }

    #[test]
    fn test_load_from_directory() {
        let config = PipelineConfig::default();
        let dir = tempfile::tempdir().expect("temp dir");
        for letter in ['A', 'Z'] {
            let img = letter_reference(letter, 128).to_gray_image();
            img.save(dir.path().join(format!("{letter}.png")))
                .expect("save template");
        }
        let strategy = TemplateStrategy::load(dir.path(), &config).expect("load gallery");
        assert_eq!(strategy.len(), 2);
        let (guess, _) = strategy.classify_one(&crop_of('Z'));
        assert_eq!(guess, Some('Z'));
    }
}
