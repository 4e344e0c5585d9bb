use crate::error::ProcessingError;
use image::{GrayImage, Luma, RgbImage};

/// BT.601 weights in 14-bit fixed point (0.299, 0.587, 0.114)
const R_WEIGHT: u32 = 4899;
const G_WEIGHT: u32 = 9617;
const B_WEIGHT: u32 = 1868;
const SHIFT: u32 = 14;

/// Convert the decoded color image to single-channel BT.601 luma
/// This is the only stage that reads the source image
pub fn apply(source: &RgbImage) -> Result<GrayImage, ProcessingError> {
    Ok(GrayImage::from_fn(source.width(), source.height(), |x, y| {
        let [r, g, b] = source.get_pixel(x, y).0;
        Luma([luma(r, g, b)])
    }))
}

fn luma(r: u8, g: u8, b: u8) -> u8 {
    let weighted = r as u32 * R_WEIGHT + g as u32 * G_WEIGHT + b as u32 * B_WEIGHT;
    ((weighted + (1 << (SHIFT - 1))) >> SHIFT) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_grayscale_weights_channels() {
        let mut img = RgbImage::new(3, 1);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        img.put_pixel(1, 0, Rgb([0, 255, 0]));
        img.put_pixel(2, 0, Rgb([0, 0, 255]));

        let gray = apply(&img).unwrap();
        let (r, g, b) = (
            gray.get_pixel(0, 0).0[0],
            gray.get_pixel(1, 0).0[0],
            gray.get_pixel(2, 0).0[0],
        );

        // Green carries the most luminance, blue the least
        assert!(g > r && r > b, "R={} G={} B={}", r, g, b);
    }

    #[test]
    fn test_primaries_use_bt601_weights() {
        let img = RgbImage::from_fn(3, 1, |x, _| match x {
            0 => Rgb([255, 0, 0]),
            1 => Rgb([0, 255, 0]),
            _ => Rgb([0, 0, 255]),
        });
        let gray = apply(&img).unwrap();
        assert_eq!(gray.get_pixel(0, 0).0[0], 76);
        assert_eq!(gray.get_pixel(1, 0).0[0], 150);
        assert_eq!(gray.get_pixel(2, 0).0[0], 29);
    }

    #[test]
    fn test_white_stays_white() {
        let img = RgbImage::from_pixel(2, 2, Rgb([255, 255, 255]));
        assert!(apply(&img).unwrap().pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn test_neutral_gray_is_preserved() {
        let img = RgbImage::from_pixel(10, 10, Rgb([128, 128, 128]));
        let gray = apply(&img).unwrap();
        assert!(gray.pixels().all(|p| p.0[0] == 128));
    }

    #[test]
    fn test_grayscale_preserves_dimensions() {
        let img = RgbImage::new(100, 50);
        let gray = apply(&img).unwrap();
        assert_eq!(gray.dimensions(), (100, 50));
    }
}
