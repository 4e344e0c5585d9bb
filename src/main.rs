use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod check;
mod config;
mod error;
mod processing;
mod processor;
mod run_id;
mod server;
mod storage;
mod upload;

#[derive(Parser, Debug)]
#[command(name = "medical-imaging-server")]
#[command(about = "Classical image-processing pipeline for radiograph uploads")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Host address to bind to
    #[arg(long, global = true, env = "IMAGING_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, global = true, env = "IMAGING_PORT", default_value = "5000")]
    pub port: u16,

    /// Maximum upload size in bytes (default: 20MB)
    #[arg(long, global = true, env = "IMAGING_MAX_FILE_SIZE", default_value = "20971520")]
    pub max_file_size: usize,

    /// Directory that receives every run's outputs
    #[arg(long, global = true, env = "IMAGING_OUTPUT_DIR", default_value = "static/outputs")]
    pub output_dir: PathBuf,

    /// Encoding of the written images
    #[arg(long, global = true, env = "IMAGING_OUTPUT_FORMAT", value_enum, default_value_t = storage::OutputFormat::Png)]
    pub output_format: storage::OutputFormat,

    /// Sigma of the 5x5 Gaussian blur (0 derives it from the kernel size)
    #[arg(long, global = true, env = "IMAGING_GAUSSIAN_SIGMA", default_value = "1.0")]
    pub gaussian_sigma: f32,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Process one image file and write its outputs
    Process {
        /// Image to process (jpg, jpeg or png)
        input: PathBuf,
    },
    /// Verify that the output directory and pipeline are usable
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = config::Config::from(&args);

    match args.command.clone().unwrap_or(Command::Serve) {
        Command::Serve => {
            config.validate()?;
            tracing::info!(
                "Starting medical-imaging-server v{}",
                env!("CARGO_PKG_VERSION")
            );
            tracing::info!("Binding to {}:{}", config.host, config.port);

            server::run(config).await
        }
        Command::Process { input } => {
            config.validate()?;
            process_file(config, input).await
        }
        Command::Check => run_check(&config),
    }
}

async fn process_file(config: config::Config, input: PathBuf) -> anyhow::Result<()> {
    let report = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
        let file_name = input
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let data = std::fs::read(&input)
            .map_err(|e| anyhow::anyhow!("Image file not found: {}: {}", input.display(), e))?;

        let source = upload::decode_upload(&file_name, &data, config.max_file_size)?;
        let processor = processor::ImageProcessor::new(&config)?;
        Ok(processor.process(&source)?)
    })
    .await??;

    println!("{}", report.run_id);
    for file in &report.files {
        println!("{}", file.path.display());
    }
    Ok(())
}

fn run_check(config: &config::Config) -> anyhow::Result<()> {
    let results = check::run_checks(config);
    for result in &results {
        let mark = if result.passed { "ok" } else { "FAILED" };
        println!("{:<18} {:<6} {}", result.name, mark, result.detail);
    }

    let failures = results.iter().filter(|r| !r.passed).count();
    if failures > 0 {
        anyhow::bail!("{} of {} checks failed", failures, results.len());
    }
    println!("All checks passed.");
    Ok(())
}
