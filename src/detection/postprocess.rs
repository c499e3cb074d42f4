use crate::error::{Result, VisionError};
use crate::models::{Detection, Observation};

/// The winning detection, in both coordinate systems.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// As reported by the detector (letterboxed input coordinates).
    pub detection: Detection,
    /// `[x_min, y_min, x_max, y_max]` in the original frame.
    pub original_box: [f32; 4],
}

impl Selection {
    pub fn center(&self) -> (f32, f32) {
        let [x_min, y_min, x_max, y_max] = self.original_box;
        ((x_min + x_max) / 2.0, (y_min + y_max) / 2.0)
    }

    pub fn observation(&self) -> Observation {
        let (x, y) = self.center();
        Observation::new(self.detection.score, y, x, 0.0)
    }
}

/// Fail unless scores are non-increasing. Only scores are read.
pub fn check_sorted(detections: &[Detection]) -> Result<()> {
    for (index, pair) in detections.windows(2).enumerate() {
        let (previous, current) = (pair[0].score, pair[1].score);
        if previous.is_nan() || current.is_nan() || previous < current {
            return Err(VisionError::UnsortedScores {
                index: index + 1,
                previous,
                current,
            });
        }
    }
    Ok(())
}

/// Confidence cutoff plus inverse-letterbox rescale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Postprocessor {
    /// Scores must be strictly greater than this.
    pub confidence_threshold: f32,
}

impl Postprocessor {
    pub fn new(confidence_threshold: f32) -> Self {
        Self {
            confidence_threshold,
        }
    }

    /// First detection above the threshold, mapped back by `1 / scale`.
    ///
    /// Relies on descending scores: the scan stops at the first entry at or
    /// below the threshold and never looks at anything after it.
    pub fn select(&self, detections: &[Detection], scale: f32) -> Result<Option<Selection>> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(VisionError::malformed(format!(
                "letterbox scale must be finite and positive, got {}",
                scale
            )));
        }
        check_sorted(detections)?;

        let winner = detections
            .iter()
            .take_while(|d| d.score > self.confidence_threshold)
            .next();

        let Some(detection) = winner else {
            return Ok(None);
        };
        if detection.bbox.iter().any(|v| !v.is_finite()) {
            return Err(VisionError::runtime(format!(
                "detector box {:?} has non-finite coordinates",
                detection.bbox
            )));
        }

        Ok(Some(Selection {
            detection: detection.clone(),
            original_box: detection.unscaled(scale),
        }))
    }

    pub fn observe(&self, detections: &[Detection], scale: f32) -> Result<Observation> {
        Ok(self
            .select(detections, scale)?
            .map(|selection| selection.observation())
            .unwrap_or(Observation::NONE))
    }
}
