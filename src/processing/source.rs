use crate::error::ProcessingError;
use image::RgbImage;

/// A decoded upload: 8-bit, three channels, row-major
#[derive(Debug, Clone)]
pub struct SourceImage {
    raster: RgbImage,
}

impl SourceImage {
    /// Decode an encoded image (PNG, JPEG, ...) held in memory.
    ///
    /// Alpha is dropped and grayscale inputs are expanded to three channels.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProcessingError> {
        if bytes.is_empty() {
            return Err(ProcessingError::EmptyInput);
        }

        let img = image::load_from_memory(bytes)?;
        Self::from_rgb(img.into_rgb8())
    }

    pub fn from_rgb(raster: RgbImage) -> Result<Self, ProcessingError> {
        let (width, height) = raster.dimensions();
        if width == 0 || height == 0 {
            return Err(ProcessingError::InvalidDimensions { width, height });
        }
        Ok(Self { raster })
    }

    pub fn raster(&self) -> &RgbImage {
        &self.raster
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.raster.dimensions()
    }
}
