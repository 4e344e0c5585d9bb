use crate::error::ProcessingError;
use image::GrayImage;
use serde::Serialize;
use std::time::Instant;

use super::source::SourceImage;
use super::stage::{Stage, StageInput};
use super::steps;

/// Tunable numeric parameters of the pipeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineParams {
    /// Sigma of the 5x5 smoothing kernel; 0 derives it from the kernel size
    pub gaussian_sigma: f32,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            gaussian_sigma: 1.0,
        }
    }
}

impl PipelineParams {
    pub fn validate(&self) -> Result<(), String> {
        if !self.gaussian_sigma.is_finite() || self.gaussian_sigma < 0.0 {
            return Err(format!(
                "gaussian sigma must be a finite, non-negative number (got {})",
                self.gaussian_sigma
            ));
        }
        Ok(())
    }
}

/// Timing information for a single stage
#[derive(Debug, Clone, Serialize)]
pub struct StepTiming {
    pub name: String,
    pub time_ms: u64,
}

/// Output of one stage
#[derive(Debug, Clone)]
pub struct DerivedImage {
    pub stage: Stage,
    pub image: GrayImage,
}

/// Every stage output of one run, in pipeline order
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    images: Vec<DerivedImage>,
    pub total_time_ms: u64,
    pub steps: Vec<StepTiming>,
}

impl PipelineOutput {
    pub fn get(&self, stage: Stage) -> Option<&GrayImage> {
        self.images
            .iter()
            .find(|derived| derived.stage == stage)
            .map(|derived| &derived.image)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DerivedImage> {
        self.images.iter()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }
}

/// The fixed filter chain. Pure: no I/O, no shared state.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    params: PipelineParams,
}

impl Pipeline {
    pub fn new(params: PipelineParams) -> Self {
        Self { params }
    }

    /// Run every stage over `source`.
    ///
    /// Any stage error aborts the whole run; no partial output is returned.
    pub fn run(&self, source: &SourceImage) -> Result<PipelineOutput, ProcessingError> {
        let start = Instant::now();
        let (width, height) = source.dimensions();
        let mut images: Vec<DerivedImage> = Vec::with_capacity(Stage::ALL.len());
        let mut timings = Vec::with_capacity(Stage::ALL.len());

        for stage in Stage::ALL {
            let step_start = Instant::now();
            let image = self.compute(stage, source, &images)?;

            if image.dimensions() != (width, height) {
                return Err(ProcessingError::StageFailure {
                    stage,
                    reason: format!(
                        "produced {}x{} raster from {}x{} input",
                        image.width(),
                        image.height(),
                        width,
                        height
                    ),
                });
            }

            if stage.is_binary() && !image.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255) {
                return Err(ProcessingError::StageFailure {
                    stage,
                    reason: "mask contains values other than 0 and 255".to_string(),
                });
            }

            let time_ms = step_start.elapsed().as_millis() as u64;
            tracing::debug!(stage = %stage, time_ms, "stage complete");
            timings.push(StepTiming {
                name: stage.as_str().to_string(),
                time_ms,
            });
            images.push(DerivedImage { stage, image });
        }

        Ok(PipelineOutput {
            images,
            total_time_ms: start.elapsed().as_millis() as u64,
            steps: timings,
        })
    }

    fn compute(
        &self,
        stage: Stage,
        source: &SourceImage,
        done: &[DerivedImage],
    ) -> Result<GrayImage, ProcessingError> {
        let input = || upstream_image(stage, done);

        match stage {
            Stage::Grayscale => steps::grayscale::apply(source.raster()),
            Stage::HistEqualized => steps::equalize::apply(input()?),
            Stage::Gaussian => steps::gaussian::apply(input()?, self.params.gaussian_sigma),
            Stage::Median => steps::median::apply(input()?),
            Stage::Sobel => steps::sobel::apply(input()?),
            Stage::Laplacian => steps::laplacian::apply(input()?),
            Stage::Canny => steps::canny::apply(input()?),
            Stage::Threshold => steps::threshold::apply(input()?),
            Stage::Adaptive => steps::adaptive::apply(input()?),
            Stage::Erosion => steps::morphology::apply_erosion(input()?),
            Stage::Dilation => steps::morphology::apply_dilation(input()?),
        }
    }
}

/// The already computed raster that `stage` reads
fn upstream_image(stage: Stage, done: &[DerivedImage]) -> Result<&GrayImage, ProcessingError> {
    let upstream = match stage.input() {
        StageInput::Stage(upstream) => upstream,
        StageInput::Source => {
            return Err(ProcessingError::StageFailure {
                stage,
                reason: "expects a grayscale input".to_string(),
            })
        }
    };
    done.iter()
        .find(|derived| derived.stage == upstream)
        .map(|derived| &derived.image)
        .ok_or_else(|| ProcessingError::StageFailure {
            stage,
            reason: format!("input '{}' has not been computed", upstream),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn uniform_source(value: u8) -> SourceImage {
        SourceImage::from_rgb(RgbImage::from_pixel(100, 100, Rgb([value, value, value]))).unwrap()
    }

    /// Soft disc with noise-like texture, enough structure for every stage
    fn phantom_source() -> SourceImage {
        let img = RgbImage::from_fn(64, 48, |x, y| {
            let dx = x as i32 - 32;
            let dy = y as i32 - 24;
            let inside = dx * dx + dy * dy < 15 * 15;
            let texture = ((x * 31 + y * 17) % 23) as u8;
            let base = if inside { 180 } else { 60 };
            Rgb([base + texture, base + texture / 2, base])
        });
        SourceImage::from_rgb(img).unwrap()
    }

    fn foreground(img: &GrayImage) -> usize {
        img.pixels().filter(|p| p.0[0] == 255).count()
    }

    #[test]
    fn test_produces_every_stage_in_order() {
        let output = Pipeline::default().run(&phantom_source()).unwrap();
        let stages: Vec<Stage> = output.iter().map(|d| d.stage).collect();
        assert_eq!(stages, Stage::ALL.to_vec());
        assert_eq!(output.steps.len(), Stage::ALL.len());
    }

    #[test]
    fn test_all_outputs_match_source_dimensions() {
        let source = phantom_source();
        let output = Pipeline::default().run(&source).unwrap();
        for derived in output.iter() {
            assert_eq!(
                derived.image.dimensions(),
                source.dimensions(),
                "stage {}",
                derived.stage
            );
        }
    }

    #[test]
    fn test_is_deterministic() {
        let source = phantom_source();
        let pipeline = Pipeline::default();
        let first = pipeline.run(&source).unwrap();
        let second = pipeline.run(&source).unwrap();

        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.stage, b.stage);
            assert_eq!(a.image.as_raw(), b.image.as_raw(), "stage {}", a.stage);
        }
    }

    #[test]
    fn test_binary_stages_only_contain_0_and_255() {
        let output = Pipeline::default().run(&phantom_source()).unwrap();
        for derived in output.iter().filter(|d| d.stage.is_binary()) {
            assert!(
                derived.image.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255),
                "stage {} is not a binary mask",
                derived.stage
            );
        }
    }

    #[test]
    fn test_morphology_is_monotonic() {
        let output = Pipeline::default().run(&phantom_source()).unwrap();
        let eroded = foreground(output.get(Stage::Erosion).unwrap());
        let thresholded = foreground(output.get(Stage::Threshold).unwrap());
        let dilated = foreground(output.get(Stage::Dilation).unwrap());
        assert!(eroded <= thresholded, "{} > {}", eroded, thresholded);
        assert!(thresholded <= dilated, "{} > {}", thresholded, dilated);
    }

    #[test]
    fn test_uniform_mid_gray_scenario() {
        let output = Pipeline::default().run(&uniform_source(128)).unwrap();

        let all = |stage: Stage, value: u8| {
            output
                .get(stage)
                .unwrap()
                .pixels()
                .all(|p| p.0[0] == value)
        };

        assert!(all(Stage::Grayscale, 128));
        assert!(all(Stage::HistEqualized, 128));
        assert!(all(Stage::Threshold, 255));
        assert!(all(Stage::Sobel, 0));
        assert!(all(Stage::Laplacian, 0));
        assert!(all(Stage::Canny, 0));
    }

    #[test]
    fn test_degenerate_black_input_is_valid() {
        let output = Pipeline::default().run(&uniform_source(0)).unwrap();
        assert_eq!(output.len(), Stage::ALL.len());
        assert_eq!(foreground(output.get(Stage::Threshold).unwrap()), 0);
    }

    #[test]
    fn test_derived_sigma_changes_smoothing_only_downstream() {
        let source = phantom_source();
        let sharp = Pipeline::new(PipelineParams {
            gaussian_sigma: 0.0,
        })
        .run(&source)
        .unwrap();
        let soft = Pipeline::new(PipelineParams {
            gaussian_sigma: 3.0,
        })
        .run(&source)
        .unwrap();

        assert_eq!(
            sharp.get(Stage::Median).unwrap(),
            soft.get(Stage::Median).unwrap()
        );
        assert_ne!(
            sharp.get(Stage::Gaussian).unwrap(),
            soft.get(Stage::Gaussian).unwrap()
        );
    }

    #[test]
    fn test_params_validation() {
        assert!(PipelineParams::default().validate().is_ok());
        assert!(PipelineParams { gaussian_sigma: 0.0 }.validate().is_ok());
        assert!(PipelineParams { gaussian_sigma: -1.0 }.validate().is_err());
        assert!(PipelineParams {
            gaussian_sigma: f32::NAN
        }
        .validate()
        .is_err());
    }
}
