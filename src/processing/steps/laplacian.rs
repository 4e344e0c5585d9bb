use crate::error::ProcessingError;
use image::{GrayImage, Luma};
use imageproc::filter::laplacian_filter;

use super::saturate_abs;

/// 3x3 Laplacian response, absolute value saturated to 8 bits
pub fn apply(image: &GrayImage) -> Result<GrayImage, ProcessingError> {
    let response = laplacian_filter(image);

    Ok(GrayImage::from_fn(image.width(), image.height(), |x, y| {
        Luma([saturate_abs(response.get_pixel(x, y).0[0] as f32)])
    }))
}
