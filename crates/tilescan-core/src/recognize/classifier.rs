//! Trained-classifier strategy backed by ONNX Runtime.
//!
//! The model artifact is produced by an external training pipeline; this
//! module owns only the inference contract: a `[N, 1, S, S]` float input
//! in [0, 1], a `[N, 26]` score output, softmax, and a confidence gate on
//! the arg-max class.

use std::path::Path;
use std::sync::Mutex;

use ndarray::{Array4, Ix2};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;

use crate::config::PipelineConfig;
use crate::error::Error;
use crate::recognize::{LetterGuess, LetterRecognizer};
use crate::rectify::TileCrop;

const LETTERS: &[u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// ONNX letter classifier.
pub struct OnnxStrategy {
    // Session::run takes &mut self; batches are serialized through the
    // lock while crop preprocessing stays parallel upstream.
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
    input_size: usize,
    min_confidence: f64,
}

impl OnnxStrategy {
    /// Load the model artifact. A present but unloadable artifact is an
    /// error: silent fallback would mask a configuration defect.
    pub fn load(path: &Path, config: &PipelineConfig) -> Result<Self, Error> {
        let model_err = |reason: String| Error::Model {
            path: path.to_path_buf(),
            reason,
        };

        let session = Session::builder()
            .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
            .and_then(|b| b.with_intra_threads(2))
            .and_then(|b| b.commit_from_file(path))
            .map_err(|e| model_err(e.to_string()))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .ok_or_else(|| model_err("model declares no inputs".into()))?;
        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| model_err("model declares no outputs".into()))?;

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
            input_size: config.classifier_input_size,
            min_confidence: config.min_classifier_confidence,
        })
    }

    fn run_batch(&self, input: Array4<f32>) -> Result<Vec<LetterGuess>, String> {
        let n = input.shape()[0];
        let tensor = Tensor::from_array(input).map_err(|e| e.to_string())?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| "classifier session lock poisoned".to_string())?;
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => tensor])
            .map_err(|e| e.to_string())?;
        let scores = outputs[self.output_name.as_str()]
            .try_extract_array::<f32>()
            .map_err(|e| e.to_string())?;
        let scores = scores
            .into_dimensionality::<Ix2>()
            .map_err(|e| e.to_string())?;
        if scores.shape() != [n, 26] {
            return Err(format!(
                "unexpected output shape {:?}, wanted [{n}, 26]",
                scores.shape()
            ));
        }

        let mut guesses = Vec::with_capacity(n);
        for row in scores.rows() {
            // Softmax; the artifact emits raw logits.
            let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            let exp: Vec<f32> = row.iter().map(|&v| (v - max).exp()).collect();
            let sum: f32 = exp.iter().sum();

            let (idx, prob) = exp
                .iter()
                .enumerate()
                .map(|(i, &e)| (i, e / sum))
                .fold((0, 0.0f32), |acc, cur| if cur.1 > acc.1 { cur } else { acc });

            let conf = f64::from(prob) * 100.0;
            if conf < self.min_confidence {
                guesses.push((None, 0.0));
            } else {
                guesses.push((Some(LETTERS[idx] as char), conf.min(100.0) as f32));
            }
        }
        Ok(guesses)
    }
}

impl LetterRecognizer for OnnxStrategy {
    fn name(&self) -> &'static str {
        "classifier"
    }

    fn classify_batch(&self, crops: &[TileCrop]) -> Vec<LetterGuess> {
        if crops.is_empty() {
            return Vec::new();
        }
        let s = self.input_size;
        let mut input = Array4::<f32>::zeros((crops.len(), 1, s, s));
        for (i, crop) in crops.iter().enumerate() {
            let resized = crop.pixels.resize(s, s);
            for y in 0..s {
                for x in 0..s {
                    input[[i, 0, y, x]] = f32::from(resized.get(x, y)) / 255.0;
                }
            }
        }

        match self.run_batch(input) {
            Ok(guesses) => guesses,
            Err(reason) => {
                // A mid-stream inference failure must not abort the frame;
                // the batch degrades to unknown.
                tracing::error!(%reason, "classifier invocation failed");
                vec![(None, 0.0); crops.len()]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_corrupt_artifact_is_a_load_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("letters.onnx");
        let mut f = std::fs::File::create(&path).expect("create file");
        f.write_all(b"not an onnx model").expect("write");

        let config = PipelineConfig::default();
        let result = OnnxStrategy::load(&path, &config);
        assert!(matches!(result, Err(Error::Model { .. })));
    }
}
