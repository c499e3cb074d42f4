use image::DynamicImage;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::diagnostics::{DiagnosticSink, NullSink};
use crate::error::Result;
use crate::models::BoundingBox;

/// Data that flows through the pipeline
/// Each PipelineData is either the whole frame or one candidate region of it
#[derive(Clone)]
pub struct PipelineData {
    /// Working image for this item (blurred frame, mask, or region crop)
    pub image: Arc<DynamicImage>,

    /// The caller's frame, shared read-only
    pub original: Arc<DynamicImage>,

    /// Candidate rectangle in the original frame (None means full frame)
    pub bbox: Option<BoundingBox>,

    /// Per-item measurements (e.g. "area", "vertices")
    pub metadata: HashMap<String, MetadataValue>,
}

/// Metadata value types
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    Bool(bool),
    Int(i64),
}

impl PipelineData {
    /// Create PipelineData for a full frame; the working image starts out
    /// as the frame itself
    pub fn from_image(original: Arc<DynamicImage>) -> Self {
        Self {
            image: original.clone(),
            original,
            bbox: None,
            metadata: HashMap::new(),
        }
    }

    /// Create PipelineData for a region of a frame
    pub fn from_region(image: DynamicImage, original: Arc<DynamicImage>, bbox: BoundingBox) -> Self {
        Self {
            image: Arc::new(image),
            original,
            bbox: Some(bbox),
            metadata: HashMap::new(),
        }
    }

    /// Same provenance, new working image
    pub fn with_image(&self, image: DynamicImage) -> Self {
        Self {
            image: Arc::new(image),
            original: self.original.clone(),
            bbox: self.bbox,
            metadata: self.metadata.clone(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: MetadataValue) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.metadata.get(key) {
            Some(MetadataValue::Bool(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.metadata.get(key) {
            Some(MetadataValue::Int(v)) => Some(*v),
            _ => None,
        }
    }
}

/// Context available to all pipeline steps
#[derive(Clone)]
pub struct PipelineContext {
    pub diagnostics: Arc<dyn DiagnosticSink>,
}

impl Default for PipelineContext {
    fn default() -> Self {
        Self {
            diagnostics: Arc::new(NullSink),
        }
    }
}

/// Trait that all pipeline steps must implement
pub trait PipelineStep: Send + Sync {
    /// Steps can split data (1 → many), filter (many → fewer), or transform (many → many)
    fn process(&self, data: Vec<PipelineData>, context: &PipelineContext) -> Result<Vec<PipelineData>>;

    /// Human-readable name, also used as the diagnostic channel
    fn name(&self) -> &str;
}

/// Composable, strictly sequential pipeline
pub struct Pipeline {
    steps: Vec<Arc<dyn PipelineStep>>,
    context: PipelineContext,
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            context: PipelineContext::default(),
        }
    }

    /// Route intermediate images to a diagnostic sink
    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.context.diagnostics = sink;
        self
    }

    pub fn add_step(mut self, step: Arc<dyn PipelineStep>) -> Self {
        self.steps.push(step);
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every step on a frame
    pub fn run(&self, input: Arc<DynamicImage>) -> Result<Vec<PipelineData>> {
        self.run_partial(input, self.steps.len())
    }

    /// Run the pipeline but stop after `num_steps` steps (useful for debugging)
    pub fn run_partial(&self, input: Arc<DynamicImage>, num_steps: usize) -> Result<Vec<PipelineData>> {
        let sink = &self.context.diagnostics;
        if sink.is_enabled() {
            sink.log(&input, "00_input");
        }

        let mut data = vec![PipelineData::from_image(input)];

        for (step_idx, step) in self.steps.iter().take(num_steps).enumerate() {
            debug!("running step {}: {} ({} items)", step_idx + 1, step.name(), data.len());
            data = step.process(data, &self.context)?;
            debug!("  → {} items", data.len());

            if sink.is_enabled() {
                let channel = format!("{:02}_{}", step_idx + 1, step.name());
                for item in &data {
                    sink.log(&item.image, &channel);
                }
            }
        }

        Ok(data)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
