use crate::error::ProcessingError;
use image::{GrayImage, Luma};
use imageproc::gradients::{horizontal_sobel, vertical_sobel};

use super::saturate_abs;

/// Gradient magnitude from 3x3 Sobel derivatives
/// sqrt(gx^2 + gy^2), rounded and saturated to 8 bits
pub fn apply(image: &GrayImage) -> Result<GrayImage, ProcessingError> {
    let gx = horizontal_sobel(image);
    let gy = vertical_sobel(image);

    Ok(GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let h = gx.get_pixel(x, y).0[0] as f32;
        let v = gy.get_pixel(x, y).0[0] as f32;
        Luma([saturate_abs(h.hypot(v))])
    }))
}
