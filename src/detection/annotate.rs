//! Drawing helpers for diagnostic images. Nothing here feeds back into results.

use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use crate::models::BoundingBox;

pub const CANDIDATE_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const SELECTED_COLOR: Rgb<u8> = Rgb([255, 0, 255]);

fn to_rect(bbox: &BoundingBox) -> Option<Rect> {
    if bbox.width == 0 || bbox.height == 0 {
        return None;
    }
    Some(Rect::at(bbox.x as i32, bbox.y as i32).of_size(bbox.width, bbox.height))
}

/// Draw a rectangle outline `thickness` pixels wide, growing inwards
pub fn draw_box(canvas: &mut RgbImage, bbox: &BoundingBox, color: Rgb<u8>, thickness: u32) {
    for inset in 0..thickness {
        if bbox.width <= 2 * inset || bbox.height <= 2 * inset {
            break;
        }
        let inner = BoundingBox::new(
            bbox.x + inset,
            bbox.y + inset,
            bbox.width - 2 * inset,
            bbox.height - 2 * inset,
        );
        if let Some(rect) = to_rect(&inner) {
            draw_hollow_rect_mut(canvas, rect, color);
        }
    }
}

/// Promote a mask to RGB and outline every candidate
pub fn annotate_candidates(mask: &GrayImage, candidates: &[BoundingBox]) -> RgbImage {
    let mut canvas = image::DynamicImage::ImageLuma8(mask.clone()).to_rgb8();
    for bbox in candidates {
        draw_box(&mut canvas, bbox, CANDIDATE_COLOR, 2);
    }
    canvas
}

/// Highlight the accepted rectangle and mark its center
pub fn annotate_selection(canvas: &mut RgbImage, bbox: &BoundingBox) {
    draw_box(canvas, bbox, SELECTED_COLOR, 3);
    let (cx, cy) = bbox.center();
    draw_filled_circle_mut(canvas, (cx as i32, cy as i32), 4, SELECTED_COLOR);
}

/// Outline a detector box given as `[x_min, y_min, x_max, y_max]`
pub fn annotate_detection(canvas: &mut RgbImage, bbox: [f32; 4], color: [u8; 3]) {
    let x_min = bbox[0].max(0.0).floor() as u32;
    let y_min = bbox[1].max(0.0).floor() as u32;
    let x_max = bbox[2].max(0.0).ceil() as u32;
    let y_max = bbox[3].max(0.0).ceil() as u32;
    if x_max <= x_min || y_max <= y_min {
        return;
    }
    let rect = BoundingBox::new(x_min, y_min, x_max - x_min, y_max - y_min);
    draw_box(canvas, &rect, Rgb(color), 2);
}
