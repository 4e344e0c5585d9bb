//! Individual pipeline stages
//!
//! Each stage is a pure function from one raster to a new raster of the
//! same dimensions.

pub mod adaptive;
pub mod canny;
pub mod equalize;
pub mod gaussian;
pub mod grayscale;
pub mod laplacian;
pub mod median;
pub mod morphology;
pub mod sobel;
pub mod threshold;

/// Border extrapolation for neighborhood filters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Border {
    /// `gfedcb|abcdefgh|gfedcba`
    Reflect101,
    /// `aaaaaa|abcdefgh|hhhhhhh`
    Replicate,
}

impl Border {
    /// Map a possibly out-of-range coordinate into `0..len`
    pub fn resolve(self, i: i64, len: u32) -> u32 {
        let last = len as i64 - 1;
        if last <= 0 {
            return 0;
        }
        match self {
            Border::Replicate => i.clamp(0, last) as u32,
            Border::Reflect101 => {
                let mut i = i;
                while i < 0 || i > last {
                    if i < 0 {
                        i = -i;
                    }
                    if i > last {
                        i = 2 * last - i;
                    }
                }
                i as u32
            }
        }
    }
}

/// Absolute value rounded and saturated to 8 bits
pub fn saturate_abs(value: f32) -> u8 {
    value.abs().round().min(255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reflect101_mirrors_without_repeating_edge() {
        assert_eq!(Border::Reflect101.resolve(-1, 5), 1);
        assert_eq!(Border::Reflect101.resolve(-2, 5), 2);
        assert_eq!(Border::Reflect101.resolve(5, 5), 3);
        assert_eq!(Border::Reflect101.resolve(6, 5), 2);
        assert_eq!(Border::Reflect101.resolve(3, 5), 3);
    }

    #[test]
    fn test_reflect101_handles_tiny_extents() {
        assert_eq!(Border::Reflect101.resolve(-3, 1), 0);
        assert_eq!(Border::Reflect101.resolve(4, 2), 0);
        assert_eq!(Border::Reflect101.resolve(-5, 2), 1);
    }

    #[test]
    fn test_replicate_clamps() {
        assert_eq!(Border::Replicate.resolve(-4, 5), 0);
        assert_eq!(Border::Replicate.resolve(9, 5), 4);
    }

    #[test]
    fn test_saturate_abs() {
        assert_eq!(saturate_abs(-3.4), 3);
        assert_eq!(saturate_abs(2.5), 3);
        assert_eq!(saturate_abs(400.0), 255);
    }
}
