use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::filter::box_filter;

/// Average each channel over a `kernel_size`×`kernel_size` window
///
/// Borders are clamped, so a dark blob touching the frame edge keeps its
/// edge side while the opposite side erodes by about `kernel_size / 2`
/// after thresholding. Its center then moves inward by a couple of pixels
/// (a 100 px square flush with the top reports `y` near 48, not 50). Like
/// the rest of the classical path this is tuned for one pool camera.
pub fn box_blur(img: &RgbImage, kernel_size: u32) -> RgbImage {
    let radius = kernel_size / 2;
    if radius == 0 {
        return img.clone();
    }

    let (width, height) = img.dimensions();
    let blurred: Vec<GrayImage> = (0..3)
        .map(|c| {
            let channel = GrayImage::from_fn(width, height, |x, y| Luma([img.get_pixel(x, y)[c]]));
            box_filter(&channel, radius, radius)
        })
        .collect();

    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            blurred[0].get_pixel(x, y)[0],
            blurred[1].get_pixel(x, y)[0],
            blurred[2].get_pixel(x, y)[0],
        ])
    })
}

/// Binary mask of pixels whose every channel lies in `[low, high]` (inclusive)
pub fn color_range(img: &RgbImage, low: [u8; 3], high: [u8; 3]) -> GrayImage {
    let (width, height) = img.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let px = img.get_pixel(x, y);
        let inside = (0..3).all(|c| px[c] >= low[c] && px[c] <= high[c]);
        Luma([if inside { 255 } else { 0 }])
    })
}
