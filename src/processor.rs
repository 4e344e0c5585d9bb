use crate::config::Config;
use crate::error::ProcessingError;
use crate::processing::{Pipeline, SourceImage, StepTiming};
use crate::run_id::RunId;
use crate::storage::{OutputFormat, OutputStore, StoredFile};

/// Result of one completed run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: RunId,
    pub files: Vec<StoredFile>,
    pub steps: Vec<StepTiming>,
    pub pipeline_time_ms: u64,
}

/// Runs the pipeline and hands the complete result set to the store
pub struct ImageProcessor {
    pipeline: Pipeline,
    store: OutputStore,
    format: OutputFormat,
}

impl ImageProcessor {
    pub fn new(config: &Config) -> Result<Self, ProcessingError> {
        let store = OutputStore::open(&config.output_dir)?;
        tracing::info!("Writing outputs to {}", store.root().display());

        Ok(Self {
            pipeline: Pipeline::new(config.pipeline),
            store,
            format: config.output_format,
        })
    }

    pub fn store(&self) -> &OutputStore {
        &self.store
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Process a decoded image under a fresh run identifier.
    ///
    /// Nothing is written unless every stage succeeded.
    pub fn process(&self, source: &SourceImage) -> Result<RunReport, ProcessingError> {
        let run_id = RunId::generate();
        let (width, height) = source.dimensions();
        tracing::info!(run_id = %run_id, width, height, "Processing image");

        let output = self.pipeline.run(source)?;
        let files = self.store.persist(&run_id, source, &output, self.format)?;

        tracing::info!(
            run_id = %run_id,
            "Pipeline completed in {}ms, {} files written",
            output.total_time_ms,
            files.len()
        );

        Ok(RunReport {
            run_id,
            files,
            steps: output.steps,
            pipeline_time_ms: output.total_time_ms,
        })
    }
}
