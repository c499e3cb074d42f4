use anyhow::Context;
use clap::{Parser, ValueEnum};
use image::{DynamicImage, ImageReader};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use subvision::{
    ClassicalSegmenter, DiagnosticSink, DirectorySink, LearnedDetector, NullSink, RtenBackend,
    VisionConfig,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Strategy {
    /// Threshold and contour heuristic (pool calibration)
    Classical,
    /// Pretrained object detector
    Learned,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Target {
    Bin,
    Gate,
}

#[derive(Parser)]
#[command(name = "subvision")]
#[command(about = "Locate a bin or gate in a camera frame")]
struct Cli {
    /// Path to input image file
    #[arg(value_name = "IMAGE")]
    image_path: PathBuf,

    /// Detection strategy
    #[arg(long, value_enum, default_value_t = Strategy::Classical)]
    strategy: Strategy,

    /// Target object (learned strategy only)
    #[arg(long, value_enum, default_value_t = Target::Bin)]
    target: Target,

    /// Detector model file (.rten), required for the learned strategy
    #[arg(long, value_name = "FILE")]
    model: Option<PathBuf>,

    /// JSON settings file overriding the built-in calibration
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Save diagnostic images to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = match &args.config {
        Some(path) => VisionConfig::from_json_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => VisionConfig::default(),
    };

    let sink: Arc<dyn DiagnosticSink> = match &args.debug_out {
        Some(dir) => Arc::new(DirectorySink::new(dir.clone())?),
        None => Arc::new(NullSink),
    };

    info!("loading image {}", args.image_path.display());
    let img = ImageReader::open(&args.image_path)?
        .decode()
        .with_context(|| format!("failed to decode image {}", args.image_path.display()))?;
    info!("image loaded: {}x{}", img.width(), img.height());
    let frame = DynamicImage::ImageRgb8(img.to_rgb8());

    let observation = match args.strategy {
        Strategy::Classical => ClassicalSegmenter::new(config.classical)?
            .with_diagnostics(sink)
            .detect(&frame)?,
        Strategy::Learned => {
            let model_path = args
                .model
                .as_ref()
                .context("--model is required for the learned strategy")?;
            let detector_config = match args.target {
                Target::Bin => config.bin,
                Target::Gate => config.gate,
            };
            let backend = RtenBackend::load(model_path, &detector_config.tensors)?;
            LearnedDetector::new(backend, detector_config)?
                .with_diagnostics(sink)
                .detect(&frame)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&observation)?);

    Ok(())
}
