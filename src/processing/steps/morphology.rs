use crate::error::ProcessingError;
use image::GrayImage;
use imageproc::distance_transform::Norm;
use imageproc::morphology::{dilate, erode};

/// A chessboard radius of 1 is a 3x3 square structuring element
const RADIUS: u8 = 1;

/// Binary erosion, one pass of a 3x3 square
pub fn apply_erosion(mask: &GrayImage) -> Result<GrayImage, ProcessingError> {
    Ok(erode(mask, Norm::LInf, RADIUS))
}

/// Binary dilation, one pass of a 3x3 square
pub fn apply_dilation(mask: &GrayImage) -> Result<GrayImage, ProcessingError> {
    Ok(dilate(mask, Norm::LInf, RADIUS))
}
