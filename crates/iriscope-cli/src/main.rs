//! iriscope: CLI for running the detection pipeline on image files.
//!
//! Loads the ONNX segmentation model once, runs detection on each
//! given image, and prints one JSON detection per image to stdout.
//! Diagnostics go to stderr so the output stays pipeable.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin iriscope -- [OPTIONS] <IMAGE_PATHS>...
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use iriscope_onnx::OnnxSegmenter;
use iriscope_pipeline::detect;

/// Pupil/iris detection on local image files.
///
/// Runs the same pipeline the HTTP service exposes, without the HTTP:
/// useful for smoke-testing a model file and for batch processing.
#[derive(Parser)]
#[command(name = "iriscope", version)]
struct Cli {
    /// Paths to input images (PNG, JPEG).
    #[arg(required = true)]
    image_paths: Vec<PathBuf>,

    /// Path to the ONNX segmentation model.
    #[arg(long, env = "MODEL_PATH", default_value = "./model/pupil_segnet.onnx")]
    model: PathBuf,

    /// Number of runs per image for timing statistics.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pretty: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    eprintln!("Model: {}", cli.model.display());
    let model = match OnnxSegmenter::load_and_warmup(&cli.model) {
        Ok(model) => model,
        Err(e) => {
            eprintln!("Error loading model: {e}");
            return ExitCode::FAILURE;
        }
    };

    for path in &cli.image_paths {
        let image_bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("Error reading {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        };
        eprintln!("Image: {} ({} bytes)", path.display(), image_bytes.len());

        let mut timings = Vec::with_capacity(cli.runs);
        let mut detection = None;
        for _ in 0..cli.runs {
            match detect(&image_bytes, &model) {
                Ok(result) => {
                    timings.push(result.inference_ms);
                    detection = Some(result);
                }
                Err(e) => {
                    eprintln!("Detection error for {}: {e}", path.display());
                    return ExitCode::FAILURE;
                }
            }
        }

        let Some(detection) = detection else {
            continue;
        };

        let json = if cli.pretty {
            serde_json::to_string_pretty(&detection)
        } else {
            serde_json::to_string(&detection)
        };
        match json {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing detection: {e}");
                return ExitCode::FAILURE;
            }
        }

        if cli.runs > 1 {
            print_timing_summary(&timings);
        }
    }

    ExitCode::SUCCESS
}

/// Print min/mean/max pipeline timings across repeated runs.
#[allow(clippy::cast_precision_loss)]
fn print_timing_summary(timings: &[f64]) {
    if timings.is_empty() {
        return;
    }
    let min = timings.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = timings.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let mean = timings.iter().sum::<f64>() / timings.len() as f64;
    eprintln!(
        "Timing ({} runs): min={min:.1}ms  mean={mean:.1}ms  max={max:.1}ms",
        timings.len(),
    );
}
