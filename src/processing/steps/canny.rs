//! Two-threshold hysteresis edge detection.
//!
//! Works directly on an already smoothed image: no extra blur is applied
//! here, the pipeline's `gaussian` stage provides it. Gradients come from
//! 3x3 Sobel derivatives and the edge strength is `|gx| + |gy|`.

use crate::error::ProcessingError;
use image::{GrayImage, Luma};
use imageproc::definitions::Image;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use std::f32::consts::PI;

pub const LOW_THRESHOLD: f32 = 100.0;
pub const HIGH_THRESHOLD: f32 = 200.0;

const EDGE: Luma<u8> = Luma([255]);

pub fn apply(image: &GrayImage) -> Result<GrayImage, ProcessingError> {
    Ok(canny(image, LOW_THRESHOLD, HIGH_THRESHOLD))
}

/// Binary edge map; edge pixels are 255, everything else 0.
pub fn canny(image: &GrayImage, low_threshold: f32, high_threshold: f32) -> GrayImage {
    debug_assert!(high_threshold >= low_threshold);
    let (width, height) = image.dimensions();

    let gx = horizontal_sobel(image);
    let gy = vertical_sobel(image);
    let magnitude = Image::from_fn(width, height, |x, y| {
        let h = gx.get_pixel(x, y).0[0] as f32;
        let v = gy.get_pixel(x, y).0[0] as f32;
        Luma([h.abs() + v.abs()])
    });

    let thinned = non_maximum_suppression(&magnitude, &gx, &gy);
    hysteresis(&thinned, low_threshold, high_threshold)
}

/// Keep only pixels that are local maxima along the gradient direction
fn non_maximum_suppression(
    g: &Image<Luma<f32>>,
    gx: &Image<Luma<i16>>,
    gy: &Image<Luma<i16>>,
) -> Image<Luma<f32>> {
    const RADIANS_TO_DEGREES: f32 = 180.0 / PI;
    let (width, height) = g.dimensions();
    let mut out = Image::from_pixel(width, height, Luma([0.0f32]));
    if width < 3 || height < 3 {
        return out;
    }

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let x_gradient = gx.get_pixel(x, y).0[0] as f32;
            let y_gradient = gy.get_pixel(x, y).0[0] as f32;
            let mut angle = y_gradient.atan2(x_gradient) * RADIANS_TO_DEGREES;
            if angle < 0.0 {
                angle += 180.0;
            }

            // Ties on an axis go to the left/upper pixel; diagonals need a strict peak
            let (before, after, diagonal) = if !(22.5..157.5).contains(&angle) {
                ((x - 1, y), (x + 1, y), false)
            } else if angle < 67.5 {
                ((x - 1, y - 1), (x + 1, y + 1), true)
            } else if angle < 112.5 {
                ((x, y - 1), (x, y + 1), false)
            } else {
                ((x + 1, y - 1), (x - 1, y + 1), true)
            };

            let pixel = g.get_pixel(x, y).0[0];
            let before = g.get_pixel(before.0, before.1).0[0];
            let after = g.get_pixel(after.0, after.1).0[0];
            let is_peak = pixel > before && (pixel > after || (!diagonal && pixel == after));
            if is_peak {
                out.put_pixel(x, y, Luma([pixel]));
            }
        }
    }
    out
}

/// Seed edges above `high` and grow them through 8-connected pixels above `low`
fn hysteresis(input: &Image<Luma<f32>>, low: f32, high: f32) -> GrayImage {
    let (width, height) = input.dimensions();
    let mut out = GrayImage::new(width, height);
    let mut stack = Vec::new();

    for y in 0..height {
        for x in 0..width {
            if input.get_pixel(x, y).0[0] <= high || out.get_pixel(x, y).0[0] != 0 {
                continue;
            }
            out.put_pixel(x, y, EDGE);
            stack.push((x, y));

            while let Some((nx, ny)) = stack.pop() {
                for (dx, dy) in NEIGHBORS {
                    let (Some(px), Some(py)) =
                        (nx.checked_add_signed(dx), ny.checked_add_signed(dy))
                    else {
                        continue;
                    };
                    if px >= width || py >= height {
                        continue;
                    }
                    if input.get_pixel(px, py).0[0] > low && out.get_pixel(px, py).0[0] == 0 {
                        out.put_pixel(px, py, EDGE);
                        stack.push((px, py));
                    }
                }
            }
        }
    }
    out
}

const NEIGHBORS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];
