use crate::error::ProcessingError;
use image::{GrayImage, Luma};

/// Global histogram equalization
///
/// Maps intensities through the normalized cumulative histogram so the
/// output histogram is approximately flat. The darkest occupied bin maps to
/// 0 and the brightest to 255. A single-valued image is returned unchanged.
pub fn apply(image: &GrayImage) -> Result<GrayImage, ProcessingError> {
    let lut = build_lut(&histogram(image));

    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        *pixel = Luma([lut[pixel.0[0] as usize]]);
    }
    Ok(out)
}

fn histogram(img: &GrayImage) -> [u64; 256] {
    let mut hist = [0u64; 256];
    for pixel in img.pixels() {
        hist[pixel.0[0] as usize] += 1;
    }
    hist
}

fn build_lut(hist: &[u64; 256]) -> [u8; 256] {
    let mut lut = [0u8; 256];
    let total: u64 = hist.iter().sum();

    let Some(first) = hist.iter().position(|&count| count > 0) else {
        return lut;
    };

    if hist[first] == total {
        lut[first] = first as u8;
        return lut;
    }

    let scale = 255.0 / (total - hist[first]) as f64;
    let mut cumulative = 0u64;
    for value in first + 1..256 {
        cumulative += hist[value];
        lut[value] = (cumulative as f64 * scale).round().min(255.0) as u8;
    }
    lut
}
