//! Radiograph filter chain
//!
//! Decodes an upload into a [`SourceImage`] and derives eleven named
//! rasters from it. Nothing in this module touches the filesystem.

pub mod pipeline;
pub mod source;
pub mod stage;
pub mod steps;

pub use pipeline::{DerivedImage, Pipeline, PipelineOutput, PipelineParams, StepTiming};
pub use source::SourceImage;
pub use stage::Stage;
