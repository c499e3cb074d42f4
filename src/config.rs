//! Calibration and detector settings.
//!
//! Defaults are the values measured for the practice pool and the
//! EfficientDet-D0 detector; every field can be overridden from a JSON file.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::error::{Result, VisionError};

/// Input sizes for EfficientDet D0..D6.
pub const EFFICIENTDET_MAX_PHI: u32 = 6;

pub fn efficientdet_input_size(phi: u32) -> Result<u32> {
    if phi > EFFICIENTDET_MAX_PHI {
        return Err(VisionError::config(format!(
            "EfficientDet compound coefficient must be 0..={}, got {}",
            EFFICIENTDET_MAX_PHI, phi
        )));
    }
    Ok(512 + 128 * phi)
}

/// Top-level settings file.
///
/// Each target section is laid over that target's own preset, so a `gate`
/// section that only sets `input_size` still has the gate classes and
/// threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "SettingsFile")]
pub struct VisionConfig {
    pub classical: ClassicalConfig,
    pub bin: DetectorConfig,
    pub gate: DetectorConfig,
}

/// On-disk shape before the target sections are merged onto their presets
#[derive(Default, Deserialize)]
#[serde(default)]
struct SettingsFile {
    classical: ClassicalConfig,
    bin: Option<Value>,
    gate: Option<Value>,
}

impl TryFrom<SettingsFile> for VisionConfig {
    type Error = VisionError;

    fn try_from(file: SettingsFile) -> Result<Self> {
        Ok(Self {
            classical: file.classical,
            bin: overlay(DetectorConfig::bins(), file.bin)?,
            gate: overlay(DetectorConfig::gates(), file.gate)?,
        })
    }
}

fn overlay(preset: DetectorConfig, section: Option<Value>) -> Result<DetectorConfig> {
    let Some(section) = section else {
        return Ok(preset);
    };
    let mut merged = serde_json::to_value(&preset)?;
    merge(&mut merged, section);
    Ok(serde_json::from_value(merged)?)
}

/// Recursive object merge; anything that is not an object replaces outright
fn merge(base: &mut Value, patch: Value) {
    match (base, patch) {
        (Value::Object(base), Value::Object(patch)) => {
            for (key, value) in patch {
                merge(base.entry(key).or_insert(Value::Null), value);
            }
        }
        (base, patch) => *base = patch,
    }
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            classical: ClassicalConfig::default(),
            bin: DetectorConfig::bins(),
            gate: DetectorConfig::gates(),
        }
    }
}

impl VisionConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: VisionConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.classical.validate()?;
        self.bin.validate()?;
        self.gate.validate()
    }
}

/// Ratio and margin heuristics for choosing one rectangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    /// Exclusive lower bound on height / width.
    pub min_ratio: f32,
    /// Exclusive upper bound on height / width.
    pub max_ratio: f32,
    /// Pixels kept clear at the left and right edges of the frame.
    pub horizontal_margin: u32,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            min_ratio: 0.5,
            max_ratio: 2.0,
            horizontal_margin: 150,
        }
    }
}

impl GeometryConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.min_ratio > 0.0 && self.min_ratio < self.max_ratio && self.max_ratio.is_finite()) {
            return Err(VisionError::config(format!(
                "ratio bounds must satisfy 0 < min < max, got ({}, {})",
                self.min_ratio, self.max_ratio
            )));
        }
        Ok(())
    }
}

/// Threshold/contour heuristic for a black outline on a white floor.
///
/// Only meaningful in the environment it was tuned for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassicalConfig {
    /// Side of the square averaging kernel; must be odd.
    pub blur_kernel: u32,
    /// Inclusive lower RGB bound of the "black" range.
    pub color_low: [u8; 3],
    /// Inclusive upper RGB bound of the "black" range.
    pub color_high: [u8; 3],
    /// Polygon tolerance as a fraction of the contour's arc length.
    pub polygon_epsilon: f64,
    /// Confidence reported for a heuristic hit.
    pub score: f32,
    pub geometry: GeometryConfig,
}

impl Default for ClassicalConfig {
    fn default() -> Self {
        Self {
            blur_kernel: 9,
            color_low: [0, 0, 0],
            color_high: [36, 36, 46],
            polygon_epsilon: 0.01,
            score: 0.8,
            geometry: GeometryConfig::default(),
        }
    }
}

impl ClassicalConfig {
    pub fn validate(&self) -> Result<()> {
        if self.blur_kernel == 0 || self.blur_kernel % 2 == 0 {
            return Err(VisionError::config(format!(
                "blur kernel must be a positive odd size, got {}",
                self.blur_kernel
            )));
        }
        if self.color_low.iter().zip(&self.color_high).any(|(lo, hi)| lo > hi) {
            return Err(VisionError::config(format!(
                "color range is empty: low {:?} exceeds high {:?}",
                self.color_low, self.color_high
            )));
        }
        if !(self.polygon_epsilon > 0.0 && self.polygon_epsilon.is_finite()) {
            return Err(VisionError::config("polygon epsilon must be positive"));
        }
        if !(self.score > 0.0 && self.score <= 1.0) {
            return Err(VisionError::config(format!(
                "heuristic score must be in (0, 1], got {}",
                self.score
            )));
        }
        self.geometry.validate()
    }
}

/// Graph node names the detector's inputs and outputs are bound to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TensorNames {
    pub input: String,
    pub boxes: String,
    pub scores: String,
    pub labels: String,
}

impl Default for TensorNames {
    fn default() -> Self {
        Self {
            input: "input_1".to_string(),
            boxes: "filtered_detections/map/TensorArrayStack/TensorArrayGatherV3".to_string(),
            scores: "filtered_detections/map/TensorArrayStack_1/TensorArrayGatherV3".to_string(),
            labels: "filtered_detections/map/TensorArrayStack_2/TensorArrayGatherV3".to_string(),
        }
    }
}

/// One parametrized learned-detector pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Side of the square model input.
    pub input_size: u32,
    /// Class names indexed by label id.
    pub classes: Vec<String>,
    /// Scores must be strictly greater than this to count.
    pub confidence_threshold: f32,
    /// RGB colors for annotation, indexed by label id (wrapping).
    pub palette: Vec<[u8; 3]>,
    /// Gray level of the letterbox padding.
    pub fill: u8,
    pub mean: [f32; 3],
    pub std: [f32; 3],
    pub tensors: TensorNames,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self::bins()
    }
}

impl DetectorConfig {
    pub fn bins() -> Self {
        Self {
            input_size: 512,
            classes: vec!["bin".to_string()],
            confidence_threshold: 0.3,
            palette: vec![[255, 255, 0]],
            fill: 128,
            mean: [0.485, 0.456, 0.406],
            std: [0.229, 0.224, 0.225],
            tensors: TensorNames::default(),
        }
    }

    pub fn gates() -> Self {
        Self {
            classes: vec!["gate".to_string()],
            confidence_threshold: 0.5,
            ..Self::bins()
        }
    }

    /// Size the input for EfficientDet-D`phi`.
    pub fn with_efficientdet(mut self, phi: u32) -> Result<Self> {
        self.input_size = efficientdet_input_size(phi)?;
        Ok(self)
    }

    pub fn class_name(&self, label: i32) -> &str {
        usize::try_from(label)
            .ok()
            .and_then(|i| self.classes.get(i))
            .map(String::as_str)
            .unwrap_or("unknown")
    }

    pub fn color(&self, label: i32) -> [u8; 3] {
        if self.palette.is_empty() {
            return [255, 255, 0];
        }
        let idx = label.rem_euclid(self.palette.len() as i32) as usize;
        self.palette[idx]
    }

    pub fn validate(&self) -> Result<()> {
        if self.input_size == 0 {
            return Err(VisionError::config("detector input size must be positive"));
        }
        if self.classes.is_empty() {
            return Err(VisionError::config("detector needs at least one class"));
        }
        if !(self.confidence_threshold >= 0.0 && self.confidence_threshold < 1.0) {
            return Err(VisionError::config(format!(
                "confidence threshold must be in [0, 1), got {}",
                self.confidence_threshold
            )));
        }
        if self.std.iter().any(|s| *s == 0.0 || !s.is_finite()) {
            return Err(VisionError::config(format!(
                "normalization std must be finite and non-zero, got {:?}",
                self.std
            )));
        }
        Ok(())
    }
}
