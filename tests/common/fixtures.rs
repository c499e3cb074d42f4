use image::{DynamicImage, Rgb, RgbImage};
use std::cell::RefCell;
use subvision::detection::letterbox::LetterboxResult;
use subvision::{InferenceBackend, RawOutputs, VisionError};

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// A uniformly white frame
pub fn blank_frame(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, WHITE)
}

/// Paint a filled rectangle
pub fn paint_rect(frame: &mut RgbImage, x: u32, y: u32, width: u32, height: u32, color: Rgb<u8>) {
    for py in y..y + height {
        for px in x..x + width {
            frame.put_pixel(px, py, color);
        }
    }
}

/// White frame with one black square
pub fn frame_with_square(width: u32, height: u32, x: u32, y: u32, side: u32) -> DynamicImage {
    let mut frame = blank_frame(width, height);
    paint_rect(&mut frame, x, y, side, side, BLACK);
    DynamicImage::ImageRgb8(frame)
}

/// Backend that replays canned outputs and remembers what it was fed
#[derive(Default)]
pub struct MockBackend {
    pub outputs: RawOutputs,
    pub fail_with: Option<String>,
    pub seen: RefCell<Vec<(usize, f32, [usize; 4])>>,
}

impl MockBackend {
    pub fn returning(boxes: Vec<f32>, scores: Vec<f32>, labels: Vec<i32>) -> Self {
        Self {
            outputs: RawOutputs {
                boxes,
                scores,
                labels,
            },
            ..Default::default()
        }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Default::default()
        }
    }
}

impl InferenceBackend for MockBackend {
    fn infer(&self, input: &LetterboxResult) -> Result<RawOutputs, VisionError> {
        self.seen
            .borrow_mut()
            .push((input.tensor.len(), input.scale, input.shape()));
        match &self.fail_with {
            Some(msg) => Err(VisionError::runtime(msg.clone())),
            None => Ok(self.outputs.clone()),
        }
    }
}
