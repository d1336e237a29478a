use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use shapescan::config::{Control, DetectorConfig};
use shapescan::detection::annotate::load_font;
use shapescan::io::{
    DirectorySink, DisplaySink, ImageSequence, KeyPoll, NullSink, SharedCalibration, SleepKeys,
    StdinControl,
};
use shapescan::{DetectionPipeline, FrameLoop, StopReason};

#[derive(Parser)]
#[command(name = "shapescan")]
#[command(about = "Detect and label colored geometric shapes in a frame sequence")]
struct Cli {
    /// Frame source: a directory of images (played in file name order) or a single image
    #[arg(value_name = "SOURCE")]
    source: PathBuf,

    /// Nominal frame rate of the source (defaults to the config value)
    #[arg(long)]
    fps: Option<f64>,

    /// Write the Processed and Mask views to this directory (must be empty)
    #[arg(long, value_name = "DIR")]
    out: Option<PathBuf>,

    /// JSON detector configuration
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// TrueType font used to draw labels; without it only boxes are drawn
    #[arg(long, value_name = "FILE")]
    font: Option<PathBuf>,

    /// Side of the square morphology kernel
    #[arg(long)]
    kernel_size: Option<u32>,

    /// Minimum contour area kept as a detection
    #[arg(long)]
    min_area: Option<f64>,

    #[arg(long)]
    h_min: Option<i64>,
    #[arg(long)]
    h_max: Option<i64>,
    #[arg(long)]
    s_min: Option<i64>,
    #[arg(long)]
    s_max: Option<i64>,
    #[arg(long)]
    v_min: Option<i64>,
    #[arg(long)]
    v_max: Option<i64>,

    /// Read calibration commands (`hmin 30`, `reset`, `show`) and ESC/`quit` from stdin
    #[arg(short, long)]
    interactive: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("shapescan={}", default_level)));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn build_config(args: &Cli) -> anyhow::Result<DetectorConfig> {
    let mut config = match &args.config {
        Some(path) => DetectorConfig::from_json_file(path)?,
        None => DetectorConfig::default(),
    };

    if let Some(kernel_size) = args.kernel_size {
        config.kernel_size = kernel_size;
    }
    if let Some(min_area) = args.min_area {
        config.min_area = min_area;
    }
    let overrides = [
        (Control::HMin, args.h_min),
        (Control::HMax, args.h_max),
        (Control::SMin, args.s_min),
        (Control::SMax, args.s_max),
        (Control::VMin, args.v_min),
        (Control::VMax, args.v_max),
    ];
    for (control, value) in overrides {
        if let Some(value) = value {
            config.calibration.set(control, value);
        }
    }

    config.validate()?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    init_logging(args.verbose);

    let config = build_config(&args)?;
    tracing::debug!(bounds = %config.calibration, ranges = config.color_ranges.len(), "Configuration loaded");

    let mut pipeline = DetectionPipeline::from_config(&config);
    if let Some(font_path) = &args.font {
        pipeline = pipeline.with_font(load_font(font_path)?);
    }

    let frame_loop = FrameLoop::new(pipeline)
        .with_preview(config.mask_preview)
        .with_default_fps(config.default_fps);

    let mut source = ImageSequence::open(&args.source, args.fps)?;

    let mut display: Box<dyn DisplaySink> = match args.out {
        Some(dir) => Box::new(DirectorySink::new(dir)?),
        None => Box::new(NullSink),
    };

    let calibration = SharedCalibration::new(config.calibration);
    let mut keys: Box<dyn KeyPoll> = if args.interactive {
        Box::new(StdinControl::spawn(calibration.clone()))
    } else {
        Box::new(SleepKeys)
    };

    let summary = frame_loop.run(&mut source, &calibration, display.as_mut(), keys.as_mut())?;

    println!("\n=== Shape Detection Results ===");
    println!("Frames processed: {}", summary.frames);
    println!("Total detections: {}", summary.detections);
    match summary.stop_reason {
        StopReason::EndOfStream => println!("Stopped: end of stream"),
        StopReason::Cancelled => println!("Stopped: cancelled"),
    }

    Ok(())
}
