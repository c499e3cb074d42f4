pub mod rten_backend;

pub use rten_backend::RtenBackend;

use crate::detection::letterbox::LetterboxResult;
use crate::error::{Result, VisionError};
use crate::models::Detection;

/// Anything that turns a letterboxed frame into raw detector outputs.
///
/// Implementations are not assumed reentrant; callers sharing one backend
/// across threads must serialize access themselves.
pub trait InferenceBackend {
    fn infer(&self, input: &LetterboxResult) -> Result<RawOutputs>;
}

impl<B: InferenceBackend + ?Sized> InferenceBackend for &B {
    fn infer(&self, input: &LetterboxResult) -> Result<RawOutputs> {
        (**self).infer(input)
    }
}

impl<B: InferenceBackend + ?Sized> InferenceBackend for Box<B> {
    fn infer(&self, input: &LetterboxResult) -> Result<RawOutputs> {
        (**self).infer(input)
    }
}

/// Flattened output tensors, expected sorted by descending score.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawOutputs {
    /// Four values per detection: `[x_min, y_min, x_max, y_max]`.
    pub boxes: Vec<f32>,
    pub scores: Vec<f32>,
    pub labels: Vec<i32>,
}

impl RawOutputs {
    /// Zip the three tensors, failing if their lengths disagree.
    pub fn into_detections(self) -> Result<Vec<Detection>> {
        let count = self.scores.len();
        if self.labels.len() != count || self.boxes.len() != count * 4 {
            return Err(VisionError::runtime(format!(
                "inconsistent detector outputs: {} scores, {} labels, {} box values",
                count,
                self.labels.len(),
                self.boxes.len()
            )));
        }

        Ok(self
            .scores
            .into_iter()
            .zip(self.labels)
            .zip(self.boxes.chunks_exact(4))
            .map(|((score, label), b)| Detection {
                score,
                label,
                bbox: [b[0], b[1], b[2], b[3]],
            })
            .collect())
    }
}
