use crate::error::ProcessingError;
use image::{GrayImage, Luma};

/// Global cutoff for the `threshold` stage
pub const CUTOFF: u8 = 120;

/// Global binary threshold: pixels at or above the cutoff become 255
pub fn apply(image: &GrayImage) -> Result<GrayImage, ProcessingError> {
    Ok(binarize(image, CUTOFF))
}

pub fn binarize(image: &GrayImage, cutoff: u8) -> GrayImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        *pixel = if pixel.0[0] >= cutoff {
            Luma([255])
        } else {
            Luma([0])
        };
    }
    out
}
