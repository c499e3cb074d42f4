use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

use crate::error::{Result, VisionError};

/// Fill, mean and std applied around the resize.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalization {
    pub fill: u8,
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

impl Default for Normalization {
    fn default() -> Self {
        Self {
            fill: 128,
            mean: [0.485, 0.456, 0.406],
            std: [0.229, 0.224, 0.225],
        }
    }
}

/// A frame resized into a square model input.
///
/// `scale` is the one factor applied to both axes, so a coordinate measured
/// on the padded image maps back with `original = scaled / scale`. The
/// resized image sits at the origin, so no padding offset is involved.
#[derive(Debug, Clone)]
pub struct LetterboxResult {
    /// Normalized NHWC data, `size * size * 3` values.
    pub tensor: Vec<f32>,
    /// Side of the square input.
    pub size: u32,
    pub scale: f32,
    pub resized_width: u32,
    pub resized_height: u32,
    /// The padded 8-bit image the tensor was computed from.
    pub padded: RgbImage,
}

impl LetterboxResult {
    /// `[1, size, size, 3]`
    pub fn shape(&self) -> [usize; 4] {
        [1, self.size as usize, self.size as usize, 3]
    }

    pub fn to_original(&self, coord: f32) -> f32 {
        coord / self.scale
    }
}

/// Uniform scale that maps the longer side of `width`×`height` onto `target_size`.
pub fn letterbox_scale(width: u32, height: u32, target_size: u32) -> Result<f32> {
    if width == 0 || height == 0 {
        return Err(VisionError::malformed(format!(
            "cannot letterbox a {}x{} frame",
            width, height
        )));
    }
    if target_size == 0 {
        return Err(VisionError::malformed("letterbox target size must be positive"));
    }
    Ok(target_size as f32 / width.max(height) as f32)
}

/// Resized dimensions `(width, height)`; the longer side is exactly `target_size`.
pub fn resized_dimensions(width: u32, height: u32, target_size: u32) -> Result<(u32, u32)> {
    let scale = letterbox_scale(width, height, target_size)?;
    let shorter = |side: u32| ((side as f32 * scale).round() as u32).clamp(1, target_size);
    Ok(if width >= height {
        (target_size, shorter(height))
    } else {
        (shorter(width), target_size)
    })
}

/// Resize preserving aspect ratio, paste at the top-left of a `fill`-gray
/// square, then normalize each channel as `(v / 255 - mean) / std`.
pub fn letterbox(frame: &RgbImage, target_size: u32, norm: &Normalization) -> Result<LetterboxResult> {
    let (width, height) = frame.dimensions();
    let scale = letterbox_scale(width, height, target_size)?;
    let (resized_width, resized_height) = resized_dimensions(width, height, target_size)?;

    let mut padded = RgbImage::from_pixel(target_size, target_size, Rgb([norm.fill; 3]));
    if (resized_width, resized_height) == (width, height) {
        imageops::replace(&mut padded, frame, 0, 0);
    } else {
        let resized = imageops::resize(frame, resized_width, resized_height, FilterType::Triangle);
        imageops::replace(&mut padded, &resized, 0, 0);
    }

    let tensor = normalize(&padded, norm);

    Ok(LetterboxResult {
        tensor,
        size: target_size,
        scale,
        resized_width,
        resized_height,
        padded,
    })
}

/// NHWC floats from an 8-bit RGB image
pub fn normalize(image: &RgbImage, norm: &Normalization) -> Vec<f32> {
    let mut out = Vec::with_capacity(image.as_raw().len());
    for px in image.pixels() {
        for c in 0..3 {
            out.push((px[c] as f32 / 255.0 - norm.mean[c]) / norm.std[c]);
        }
    }
    out
}
