use crate::config::GeometryConfig;
use crate::models::BoundingBox;

/// Whether a rectangle is near-square and clear of the left/right edges
pub fn is_plausible(rect: &BoundingBox, frame_width: u32, config: &GeometryConfig) -> bool {
    let ratio = rect.ratio();
    if !(ratio > config.min_ratio && ratio < config.max_ratio) {
        return false;
    }

    let center_x = rect.center_x();
    let margin = config.horizontal_margin as f32;
    center_x > margin && center_x < frame_width as f32 - margin
}

/// Pick the largest plausible rectangle.
///
/// Greedy: candidates are visited by descending area and the first one that
/// passes [`is_plausible`] wins. Ties keep their input order.
pub fn select_rectangle(
    rects: &[BoundingBox],
    frame_width: u32,
    config: &GeometryConfig,
) -> Option<BoundingBox> {
    let mut by_area: Vec<&BoundingBox> = rects.iter().collect();
    by_area.sort_by(|a, b| b.area().cmp(&a.area()));
    by_area
        .into_iter()
        .find(|rect| is_plausible(rect, frame_width, config))
        .copied()
}
