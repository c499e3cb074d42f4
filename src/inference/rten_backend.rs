use rten::{Model, NodeId};
use rten_tensor::prelude::*;
use rten_tensor::{NdTensor, Tensor};
use std::path::Path;
use tracing::{debug, info};

use crate::config::TensorNames;
use crate::detection::letterbox::LetterboxResult;
use crate::error::{Result, VisionError};
use crate::inference::{InferenceBackend, RawOutputs};

/// Detector loaded from an `.rten` model file.
pub struct RtenBackend {
    model: Model,
    input: NodeId,
    boxes: NodeId,
    scores: NodeId,
    labels: NodeId,
}

fn resolve(model: &Model, name: &str) -> Result<NodeId> {
    model
        .find_node(name)
        .ok_or_else(|| VisionError::ModelLoad(format!("model has no tensor named '{}'", name)))
}

impl RtenBackend {
    pub fn load(path: impl AsRef<Path>, names: &TensorNames) -> Result<Self> {
        let path = path.as_ref();
        info!("loading detector model {}", path.display());
        let model = Model::load_file(path)
            .map_err(|e| VisionError::ModelLoad(format!("{}: {}", path.display(), e)))?;

        let backend = Self {
            input: resolve(&model, &names.input)?,
            boxes: resolve(&model, &names.boxes)?,
            scores: resolve(&model, &names.scores)?,
            labels: resolve(&model, &names.labels)?,
            model,
        };
        info!("detector model loaded");
        Ok(backend)
    }
}

impl InferenceBackend for RtenBackend {
    fn infer(&self, input: &LetterboxResult) -> Result<RawOutputs> {
        let tensor: Tensor<f32> = NdTensor::from_data(input.shape(), input.tensor.clone()).into_dyn();

        debug!("running detector on {:?} input", input.shape());
        let mut outputs = self
            .model
            .run(
                vec![(self.input, tensor.view().into())],
                &[self.boxes, self.scores, self.labels],
                None,
            )
            .map_err(|e| VisionError::runtime(e.to_string()))?;

        if outputs.len() != 3 {
            return Err(VisionError::runtime(format!(
                "expected 3 output tensors, got {}",
                outputs.len()
            )));
        }
        let labels: Tensor<i32> = outputs
            .remove(2)
            .try_into()
            .map_err(|_| VisionError::runtime("labels tensor is not int32"))?;
        let scores: Tensor<f32> = outputs
            .remove(1)
            .try_into()
            .map_err(|_| VisionError::runtime("scores tensor is not float32"))?;
        let boxes: Tensor<f32> = outputs
            .remove(0)
            .try_into()
            .map_err(|_| VisionError::runtime("boxes tensor is not float32"))?;

        Ok(RawOutputs {
            boxes: boxes.to_vec(),
            scores: scores.to_vec(),
            labels: labels.to_vec(),
        })
    }
}
