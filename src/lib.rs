pub mod config;
pub mod detection;
pub mod diagnostics;
pub mod error;
pub mod inference;
pub mod models;
pub mod pipeline;

pub use config::{ClassicalConfig, DetectorConfig, GeometryConfig, TensorNames, VisionConfig};
pub use detection::{ClassicalSegmenter, LearnedDetector};
pub use diagnostics::{DiagnosticSink, DirectorySink, NullSink};
pub use error::VisionError;
pub use inference::{InferenceBackend, RawOutputs, RtenBackend};
pub use models::{BoundingBox, Detection, Observation};
pub use pipeline::{MetadataValue, Pipeline, PipelineContext, PipelineData, PipelineStep};
