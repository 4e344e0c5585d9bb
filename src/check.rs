//! Setup verification for the `check` subcommand

use crate::config::Config;
use crate::processing::{Pipeline, SourceImage, Stage};
use image::{Rgb, RgbImage};
use std::fs;
use std::io::Write;

/// Outcome of a single check
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: &'static str,
    pub passed: bool,
    pub detail: String,
}

impl CheckResult {
    fn pass(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            passed: true,
            detail: detail.into(),
        }
    }

    fn fail(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            passed: false,
            detail: detail.into(),
        }
    }
}

/// Run every check against `config`
pub fn run_checks(config: &Config) -> Vec<CheckResult> {
    vec![
        check_config(config),
        check_output_dir(config),
        check_output_writable(config),
        check_pipeline(config),
    ]
}

fn check_config(config: &Config) -> CheckResult {
    match config.validate() {
        Ok(()) => CheckResult::pass("configuration", "parameters are valid"),
        Err(e) => CheckResult::fail("configuration", e.to_string()),
    }
}

fn check_output_dir(config: &Config) -> CheckResult {
    let dir = &config.output_dir;
    if dir.is_dir() {
        return CheckResult::pass("output directory", format!("{} exists", dir.display()));
    }
    match fs::create_dir_all(dir) {
        Ok(()) => CheckResult::pass("output directory", format!("created {}", dir.display())),
        Err(e) => CheckResult::fail(
            "output directory",
            format!("cannot create {}: {}", dir.display(), e),
        ),
    }
}

fn check_output_writable(config: &Config) -> CheckResult {
    let probe = tempfile::Builder::new()
        .prefix(".write-probe")
        .tempfile_in(&config.output_dir)
        .and_then(|mut file| file.write_all(b"probe"));

    match probe {
        Ok(()) => CheckResult::pass("output writable", "probe file written"),
        Err(e) => CheckResult::fail(
            "output writable",
            format!("cannot write to {}: {}", config.output_dir.display(), e),
        ),
    }
}

fn check_pipeline(config: &Config) -> CheckResult {
    let source = RgbImage::from_pixel(16, 16, Rgb([128, 128, 128]));
    let result = SourceImage::from_rgb(source)
        .and_then(|source| Pipeline::new(config.pipeline).run(&source));

    let output = match result {
        Ok(output) => output,
        Err(e) => return CheckResult::fail("pipeline", e.to_string()),
    };

    // Mid-gray sits above the global cutoff
    let saturated = output
        .get(Stage::Threshold)
        .is_some_and(|mask| mask.pixels().all(|p| p.0[0] == 255));
    if saturated {
        CheckResult::pass("pipeline", format!("{} stages ran", output.len()))
    } else {
        CheckResult::fail("pipeline", "threshold stage produced an unexpected mask")
    }
}
