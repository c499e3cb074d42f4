use image::GrayImage;
use imageproc::contours::find_contours;
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::point::Point;

use crate::models::BoundingBox;

/// A traced region boundary, simplified to a polygon
#[derive(Debug, Clone)]
pub struct TracedContour {
    pub polygon: Vec<Point<u32>>,
    /// Index of the enclosing contour, if any
    pub parent: Option<usize>,
}

impl TracedContour {
    /// Bounding rectangle of the simplified polygon
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::enclosing(self.polygon.iter().map(|p| (p.x, p.y)))
    }
}

/// Trace every border in a binary mask (nested borders included) and
/// simplify each with Douglas–Peucker at `epsilon_fraction` of its arc length
pub fn trace_contours(mask: &GrayImage, epsilon_fraction: f64) -> Vec<TracedContour> {
    find_contours::<u32>(mask)
        .into_iter()
        .map(|contour| TracedContour {
            polygon: approximate(&contour.points, epsilon_fraction),
            parent: contour.parent,
        })
        .collect()
}

fn approximate(points: &[Point<u32>], epsilon_fraction: f64) -> Vec<Point<u32>> {
    // Degenerate borders (isolated pixels, one-pixel lines) have nothing to simplify
    if points.len() < 3 {
        return points.to_vec();
    }
    let epsilon = epsilon_fraction * arc_length(points, true);
    if epsilon <= 0.0 {
        return points.to_vec();
    }
    approximate_polygon_dp(points, epsilon, true)
}
