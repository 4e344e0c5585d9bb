use crate::error::ProcessingError;
use image::GrayImage;
use imageproc::filter::median_filter;

/// Kernel width of the median filter
pub const KERNEL_SIZE: u32 = 5;

/// Median filter over a 5x5 window
/// Removes salt-and-pepper noise while keeping edges sharp
pub fn apply(image: &GrayImage) -> Result<GrayImage, ProcessingError> {
    let radius = KERNEL_SIZE / 2;
    Ok(median_filter(image, radius, radius))
}
