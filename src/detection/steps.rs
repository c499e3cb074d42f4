use crate::config::GeometryConfig;
use crate::detection::{annotate, contours, geometry, preprocessing};
use crate::error::{Result, VisionError};
use crate::models::BoundingBox;
use crate::pipeline::{MetadataValue, PipelineContext, PipelineData, PipelineStep};
use image::{DynamicImage, GenericImageView, GrayImage, RgbImage};
use std::borrow::Cow;

/// Borrow an item's RGB raster, converting only when it is stored otherwise
fn rgb_view(image: &DynamicImage) -> Cow<'_, RgbImage> {
    match image.as_rgb8() {
        Some(rgb) => Cow::Borrowed(rgb),
        None => Cow::Owned(image.to_rgb8()),
    }
}

fn luma_view(image: &DynamicImage) -> Cow<'_, GrayImage> {
    match image.as_luma8() {
        Some(mask) => Cow::Borrowed(mask),
        None => Cow::Owned(image.to_luma8()),
    }
}

/// Square averaging blur over the color frame
pub struct BoxBlurStep {
    pub kernel_size: u32,
}

impl PipelineStep for BoxBlurStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::with_capacity(data.len());
        for item in data {
            let blurred = preprocessing::box_blur(&rgb_view(&item.image), self.kernel_size);
            result.push(item.with_image(DynamicImage::ImageRgb8(blurred)));
        }
        Ok(result)
    }

    fn name(&self) -> &str {
        "box_blur"
    }
}

/// Inclusive per-channel color threshold into a binary mask
pub struct ColorRangeStep {
    pub low: [u8; 3],
    pub high: [u8; 3],
}

impl PipelineStep for ColorRangeStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::with_capacity(data.len());
        for item in data {
            let mask = preprocessing::color_range(&rgb_view(&item.image), self.low, self.high);
            result.push(item.with_image(DynamicImage::ImageLuma8(mask)));
        }
        Ok(result)
    }

    fn name(&self) -> &str {
        "color_range"
    }
}

/// Contours → simplified polygons → bounding rectangles.
/// Splits one mask into one item per contour.
pub struct ContourRectStep {
    pub epsilon_fraction: f64,
}

impl PipelineStep for ContourRectStep {
    fn process(&self, data: Vec<PipelineData>, context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();

        for item in data {
            let mask = luma_view(&item.image);
            let traced = contours::trace_contours(&mask, self.epsilon_fraction);
            let (img_width, img_height) = item.original.dimensions();

            let mut candidates = Vec::with_capacity(traced.len());
            for contour in &traced {
                let Some(bbox) = contour.bounding_box() else {
                    continue;
                };
                if bbox.right() > img_width || bbox.bottom() > img_height {
                    return Err(VisionError::malformed(format!(
                        "mask is larger than the frame: rectangle {:?} in {}x{}",
                        bbox, img_width, img_height
                    )));
                }
                candidates.push(bbox);

                let region = item.image.crop_imm(bbox.x, bbox.y, bbox.width, bbox.height);
                let candidate = PipelineData::from_region(region, item.original.clone(), bbox)
                    .with_metadata("area", MetadataValue::Int(bbox.area() as i64))
                    .with_metadata("vertices", MetadataValue::Int(contour.polygon.len() as i64))
                    .with_metadata("nested", MetadataValue::Bool(contour.parent.is_some()));
                result.push(candidate);
            }

            if context.diagnostics.is_enabled() {
                let canvas = annotate::annotate_candidates(&mask, &candidates);
                context.diagnostics.log(&DynamicImage::ImageRgb8(canvas), "candidates");
            }
        }

        Ok(result)
    }

    fn name(&self) -> &str {
        "contour_rects"
    }
}

/// Keep at most one candidate: the largest near-square one inside the margins
pub struct GeometryFilterStep {
    pub config: GeometryConfig,
}

impl PipelineStep for GeometryFilterStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let Some(first) = data.first() else {
            return Ok(Vec::new());
        };
        let frame_width = first.original.width();

        let rects: Vec<BoundingBox> = data.iter().filter_map(|item| item.bbox).collect();
        let Some(selected) = geometry::select_rectangle(&rects, frame_width, &self.config) else {
            return Ok(Vec::new());
        };

        Ok(data
            .into_iter()
            .find(|item| item.bbox == Some(selected))
            .into_iter()
            .collect())
    }

    fn name(&self) -> &str {
        "geometry_filter"
    }
}
