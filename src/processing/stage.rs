use std::fmt;

/// Named pipeline stages, declared in execution order.
///
/// Every stage reads the output of exactly one upstream stage (or the
/// decoded source image, for [`Stage::Grayscale`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Grayscale,
    HistEqualized,
    Gaussian,
    Median,
    Sobel,
    Laplacian,
    Canny,
    Threshold,
    Adaptive,
    Erosion,
    Dilation,
}

/// Where a stage reads its input from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageInput {
    Source,
    Stage(Stage),
}

impl Stage {
    /// All stages in pipeline order
    pub const ALL: [Self; 11] = [
        Self::Grayscale,
        Self::HistEqualized,
        Self::Gaussian,
        Self::Median,
        Self::Sobel,
        Self::Laplacian,
        Self::Canny,
        Self::Threshold,
        Self::Adaptive,
        Self::Erosion,
        Self::Dilation,
    ];

    /// Name used in output filenames and API responses
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Grayscale => "grayscale",
            Self::HistEqualized => "hist_equalized",
            Self::Gaussian => "gaussian",
            Self::Median => "median",
            Self::Sobel => "sobel",
            Self::Laplacian => "laplacian",
            Self::Canny => "canny",
            Self::Threshold => "threshold",
            Self::Adaptive => "adaptive",
            Self::Erosion => "erosion",
            Self::Dilation => "dilation",
        }
    }

    /// The raster this stage consumes
    pub const fn input(self) -> StageInput {
        match self {
            Self::Grayscale => StageInput::Source,
            Self::HistEqualized | Self::Median => StageInput::Stage(Self::Grayscale),
            Self::Gaussian => StageInput::Stage(Self::HistEqualized),
            Self::Sobel | Self::Laplacian | Self::Canny | Self::Threshold | Self::Adaptive => {
                StageInput::Stage(Self::Gaussian)
            }
            Self::Erosion | Self::Dilation => StageInput::Stage(Self::Threshold),
        }
    }

    /// Stages whose output is a 0/255 mask
    pub const fn is_binary(self) -> bool {
        matches!(
            self,
            Self::Canny | Self::Threshold | Self::Adaptive | Self::Erosion | Self::Dilation
        )
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
