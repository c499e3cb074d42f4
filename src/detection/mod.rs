pub mod annotate;
pub mod contours;
pub mod geometry;
pub mod letterbox;
pub mod postprocess;
pub mod preprocessing;
pub mod steps;

use image::DynamicImage;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::{ClassicalConfig, DetectorConfig};
use crate::diagnostics::{DiagnosticSink, NullSink};
use crate::error::Result;
use crate::inference::InferenceBackend;
use crate::models::{Observation, rgb_frame};
use crate::pipeline::Pipeline;
use letterbox::Normalization;
use postprocess::Postprocessor;

/// Build the threshold/contour pipeline from its calibration
pub fn build_classical_pipeline(config: &ClassicalConfig) -> Pipeline {
    use steps::*;

    Pipeline::new()
        .add_step(Arc::new(BoxBlurStep {
            kernel_size: config.blur_kernel,
        }))
        .add_step(Arc::new(ColorRangeStep {
            low: config.color_low,
            high: config.color_high,
        }))
        .add_step(Arc::new(ContourRectStep {
            epsilon_fraction: config.polygon_epsilon,
        }))
        .add_step(Arc::new(GeometryFilterStep {
            config: config.geometry.clone(),
        }))
}

/// Classical path: blur, threshold for near-black, pick the largest
/// near-square contour away from the frame edges.
///
/// Tuned for a black outline on a white pool floor; it is not a
/// general-purpose segmenter.
pub struct ClassicalSegmenter {
    config: ClassicalConfig,
    pipeline: Pipeline,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl ClassicalSegmenter {
    pub fn new(config: ClassicalConfig) -> Result<Self> {
        config.validate()?;
        let pipeline = build_classical_pipeline(&config);
        Ok(Self {
            config,
            pipeline,
            diagnostics: Arc::new(NullSink),
        })
    }

    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.pipeline = build_classical_pipeline(&self.config).with_diagnostics(sink.clone());
        self.diagnostics = sink;
        self
    }

    pub fn config(&self) -> &ClassicalConfig {
        &self.config
    }

    pub fn detect(&self, frame: &DynamicImage) -> Result<Observation> {
        let rgb = rgb_frame(frame)?;
        let survivors = self.pipeline.run(Arc::new(frame.clone()))?;

        let Some(bbox) = survivors.first().and_then(|item| item.bbox) else {
            debug!("no plausible rectangle");
            return Ok(Observation::NONE);
        };

        if self.diagnostics.is_enabled() {
            let mut canvas = rgb.clone();
            annotate::annotate_selection(&mut canvas, &bbox);
            self.diagnostics.log(&DynamicImage::ImageRgb8(canvas), "selection");
        }

        let (x, y) = bbox.center();
        debug!("selected {:?}, center ({}, {})", bbox, x, y);
        Ok(Observation::new(self.config.score, y as f32, x as f32, 0.0))
    }
}

/// Learned path: letterbox, run the detector, keep the best box above the
/// confidence threshold and map it back to frame coordinates.
///
/// One instance per target; bins and gates differ only in configuration.
pub struct LearnedDetector<B> {
    backend: B,
    config: DetectorConfig,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl<B: InferenceBackend> LearnedDetector<B> {
    pub fn new(backend: B, config: DetectorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            backend,
            config,
            diagnostics: Arc::new(NullSink),
        })
    }

    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = sink;
        self
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn normalization(&self) -> Normalization {
        Normalization {
            fill: self.config.fill,
            mean: self.config.mean,
            std: self.config.std,
        }
    }

    pub fn detect(&self, frame: &DynamicImage) -> Result<Observation> {
        let rgb = rgb_frame(frame)?;
        if self.diagnostics.is_enabled() {
            self.diagnostics.log(frame, "input");
        }

        let input = letterbox::letterbox(rgb, self.config.input_size, &self.normalization())?;
        debug!(
            "letterboxed {}x{} to {}x{} (scale {})",
            rgb.width(),
            rgb.height(),
            input.resized_width,
            input.resized_height,
            input.scale
        );

        let detections = self.backend.infer(&input)?.into_detections()?;
        debug!("detector returned {} candidates", detections.len());

        let postprocessor = Postprocessor::new(self.config.confidence_threshold);
        let Some(selection) = postprocessor.select(&detections, input.scale)? else {
            return Ok(Observation::NONE);
        };

        let label = selection.detection.label;
        info!(
            "{} found (score {:.3})",
            self.config.class_name(label),
            selection.detection.score
        );

        if self.diagnostics.is_enabled() {
            let mut canvas = input.padded.clone();
            annotate::annotate_detection(&mut canvas, selection.detection.bbox, self.config.color(label));
            self.diagnostics.log(&DynamicImage::ImageRgb8(canvas), "detection");
        }

        Ok(selection.observation())
    }
}
