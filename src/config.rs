use crate::processing::PipelineParams;
use crate::storage::OutputFormat;
use crate::upload::DEFAULT_MAX_FILE_SIZE;
use crate::Args;
use std::path::PathBuf;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub max_file_size: usize,
    pub output_dir: PathBuf,
    pub output_format: OutputFormat,
    pub pipeline: PipelineParams,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            output_dir: PathBuf::from("static/outputs"),
            output_format: OutputFormat::Png,
            pipeline: PipelineParams::default(),
        }
    }
}

impl From<&Args> for Config {
    fn from(args: &Args) -> Self {
        Self {
            host: args.host.clone(),
            port: args.port,
            max_file_size: args.max_file_size,
            output_dir: args.output_dir.clone(),
            output_format: args.output_format,
            pipeline: PipelineParams {
                gaussian_sigma: args.gaussian_sigma,
            },
        }
    }
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        self.pipeline
            .validate()
            .map_err(|e| anyhow::anyhow!("invalid pipeline parameters: {}", e))?;
        if self.max_file_size == 0 {
            anyhow::bail!("max file size must be greater than zero");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_defaults_from_empty_command_line() {
        let args = Args::parse_from(["medical-imaging-server"]);
        let config = Config::from(&args);

        assert_eq!(config.port, 5000);
        assert_eq!(config.max_file_size, 20 * 1024 * 1024);
        assert_eq!(config.output_format, OutputFormat::Png);
        assert_eq!(config.pipeline, PipelineParams::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = Args::parse_from([
            "medical-imaging-server",
            "--port",
            "8080",
            "--output-format",
            "jpeg",
            "--gaussian-sigma",
            "0",
            "--output-dir",
            "/tmp/out",
        ]);
        let config = Config::from(&args);

        assert_eq!(config.port, 8080);
        assert_eq!(config.output_format, OutputFormat::Jpeg);
        assert_eq!(config.pipeline.gaussian_sigma, 0.0);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_negative_sigma_rejected() {
        let config = Config {
            pipeline: PipelineParams {
                gaussian_sigma: -2.0,
            },
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
