use image::{DynamicImage, RgbImage};
use serde::Serialize;

use crate::error::{Result, VisionError};

/// Axis-aligned rectangle in pixel units of the frame it was measured on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Smallest box enclosing every point, inclusive of both extremes.
    pub fn enclosing<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = (u32, u32)>,
    {
        let mut iter = points.into_iter();
        let (x0, y0) = iter.next()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (x0, y0, x0, y0);
        for (x, y) in iter {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        Some(Self::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// height / width
    pub fn ratio(&self) -> f32 {
        if self.width == 0 {
            return f32::INFINITY;
        }
        self.height as f32 / self.width as f32
    }

    pub fn center_x(&self) -> f32 {
        self.x as f32 + self.width as f32 / 2.0
    }

    /// Integer center, truncated the same way the pool calibration was measured.
    pub fn center(&self) -> (u32, u32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }
}

/// One entry of a detector's output, in letterboxed-input coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub score: f32,
    pub label: i32,
    pub bbox: [f32; 4], // [x_min, y_min, x_max, y_max]
}

impl Detection {
    /// Map the box back through a uniform resize factor.
    pub fn unscaled(&self, scale: f32) -> [f32; 4] {
        self.bbox.map(|v| v / scale)
    }
}

/// Best-guess location of the target in the original frame.
///
/// `score == 0` with every other field zero is the only "nothing found"
/// encoding; a positive score means `x`/`y` are pixel coordinates of the
/// target center. Distance is reserved and reported as zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Observation {
    pub score: f32,
    pub y: f32,
    pub x: f32,
    pub distance: f32,
}

impl Observation {
    pub const NONE: Observation = Observation {
        score: 0.0,
        y: 0.0,
        x: 0.0,
        distance: 0.0,
    };

    /// Build an observation, collapsing anything without a usable positive
    /// score (or with non-finite coordinates) to [`Observation::NONE`].
    pub fn new(score: f32, y: f32, x: f32, distance: f32) -> Self {
        let usable = score.is_finite()
            && score > 0.0
            && y.is_finite()
            && x.is_finite()
            && distance.is_finite();
        if !usable {
            return Self::NONE;
        }
        Self { score, y, x, distance }
    }

    pub fn found(&self) -> bool {
        self.score > 0.0
    }
}

/// Borrow the 8-bit RGB raster behind a frame, rejecting anything else.
pub fn rgb_frame(frame: &DynamicImage) -> Result<&RgbImage> {
    match frame {
        DynamicImage::ImageRgb8(rgb) => {
            if rgb.width() == 0 || rgb.height() == 0 {
                return Err(VisionError::malformed(format!(
                    "frame has zero area ({}x{})",
                    rgb.width(),
                    rgb.height()
                )));
            }
            Ok(rgb)
        }
        other => Err(VisionError::malformed(format!(
            "expected 8-bit RGB frame with 3 channels, got {:?} with {} channels",
            other.color(),
            other.color().channel_count()
        ))),
    }
}
