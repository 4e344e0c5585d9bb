use crate::error::ProcessingError;
use image::{GrayImage, Luma};

use super::Border;

/// Side length of the smoothing kernel
pub const KERNEL_SIZE: usize = 5;

/// Binomial approximations used when sigma is derived from the kernel size
const SMALL_KERNELS: [&[f32]; 4] = [
    &[1.0],
    &[0.25, 0.5, 0.25],
    &[0.0625, 0.25, 0.375, 0.25, 0.0625],
    &[0.03125, 0.109375, 0.21875, 0.28125, 0.21875, 0.109375, 0.03125],
];

/// Separable 5x5 Gaussian smoothing
///
/// A non-positive `sigma` is derived from the kernel size.
pub fn apply(image: &GrayImage, sigma: f32) -> Result<GrayImage, ProcessingError> {
    let kernel = gaussian_kernel(KERNEL_SIZE, sigma);
    Ok(separable_blur(image, &kernel, Border::Reflect101))
}

/// Sigma implied by a kernel size when none is given
pub fn sigma_for_size(size: usize) -> f32 {
    0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Normalized 1-D Gaussian weights of odd length `size`
pub fn gaussian_kernel(size: usize, sigma: f32) -> Vec<f32> {
    debug_assert!(size % 2 == 1, "kernel size must be odd");

    if sigma <= 0.0 && size <= 7 {
        return SMALL_KERNELS[size / 2].to_vec();
    }

    let sigma = if sigma > 0.0 {
        sigma
    } else {
        sigma_for_size(size)
    };
    let center = (size / 2) as f32;
    let denom = 2.0 * sigma * sigma;

    let weights: Vec<f64> = (0..size)
        .map(|i| {
            let d = i as f32 - center;
            ((-d * d) / denom).exp() as f64
        })
        .collect();
    let sum: f64 = weights.iter().sum();

    weights.iter().map(|w| (w / sum) as f32).collect()
}

/// Correlate with `kernel` along rows, then along columns.
/// The intermediate result stays in floating point; only the final
/// value is rounded back to 8 bits.
pub fn separable_blur(image: &GrayImage, kernel: &[f32], border: Border) -> GrayImage {
    let (width, height) = image.dimensions();
    let radius = (kernel.len() / 2) as i64;

    let mut rows = vec![0.0f32; width as usize * height as usize];
    for y in 0..height {
        for x in 0..width {
            let acc: f32 = kernel
                .iter()
                .enumerate()
                .map(|(k, weight)| {
                    let sx = border.resolve(x as i64 + k as i64 - radius, width);
                    weight * image.get_pixel(sx, y).0[0] as f32
                })
                .sum();
            rows[(y * width + x) as usize] = acc;
        }
    }

    GrayImage::from_fn(width, height, |x, y| {
        let acc: f32 = kernel
            .iter()
            .enumerate()
            .map(|(k, weight)| {
                let sy = border.resolve(y as i64 + k as i64 - radius, height);
                weight * rows[(sy * width + x) as usize]
            })
            .sum();
        Luma([acc.round().clamp(0.0, 255.0) as u8])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_is_normalized_and_symmetric() {
        for sigma in [0.0, 1.0, 2.5] {
            let kernel = gaussian_kernel(KERNEL_SIZE, sigma);
            assert_eq!(kernel.len(), KERNEL_SIZE);
            let sum: f32 = kernel.iter().sum();
            assert!((sum - 1.0).abs() < 1e-5, "sigma {} sums to {}", sigma, sum);
            assert_eq!(kernel[0], kernel[4]);
            assert_eq!(kernel[1], kernel[3]);
            assert!(kernel[2] > kernel[1] && kernel[1] > kernel[0]);
        }
    }

    #[test]
    fn test_derived_sigma_for_adaptive_block() {
        assert!((sigma_for_size(11) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_uniform_image_unchanged() {
        let img = GrayImage::from_pixel(20, 20, Luma([200]));
        let result = apply(&img, 1.0).unwrap();
        assert_eq!(result, img);
    }

    #[test]
    fn test_smooths_single_spike() {
        let mut img = GrayImage::new(9, 9);
        img.put_pixel(4, 4, Luma([255]));

        let result = apply(&img, 1.0).unwrap();
        let center = result.get_pixel(4, 4).0[0];
        let neighbor = result.get_pixel(5, 4).0[0];

        assert!(center < 255);
        assert!(neighbor > 0);
        assert!(center > neighbor);
    }

    #[test]
    fn test_blur_preserves_dimensions() {
        let img = GrayImage::new(3, 17);
        let result = apply(&img, 0.0).unwrap();
        assert_eq!(result.dimensions(), (3, 17));
    }
}
