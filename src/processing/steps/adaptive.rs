use crate::error::ProcessingError;
use image::{GrayImage, Luma};

use super::gaussian::{gaussian_kernel, separable_blur};
use super::Border;

/// Side length of the local neighborhood
pub const BLOCK_SIZE: usize = 11;
/// Subtracted from the weighted local mean
pub const OFFSET: i16 = 2;

/// Local threshold against a Gaussian-weighted neighborhood mean
///
/// A pixel becomes 255 when it is brighter than `mean - OFFSET`, where
/// `mean` is the Gaussian-weighted average of its 11x11 neighborhood.
pub fn apply(image: &GrayImage) -> Result<GrayImage, ProcessingError> {
    Ok(adaptive_threshold(image, BLOCK_SIZE, OFFSET))
}

pub fn adaptive_threshold(image: &GrayImage, block_size: usize, offset: i16) -> GrayImage {
    let kernel = gaussian_kernel(block_size, 0.0);
    let mean = separable_blur(image, &kernel, Border::Replicate);

    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let pixel = image.get_pixel(x, y).0[0] as i16;
        let cutoff = mean.get_pixel(x, y).0[0] as i16 - offset;
        if pixel > cutoff {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}
