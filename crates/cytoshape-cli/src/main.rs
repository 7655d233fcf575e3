//! cytoshape: command-line driver for the cytoshape analysis core.
//!
//! Four subcommands:
//!
//! - `process` runs a stage pipeline over an image and writes the result,
//! - `count` thresholds/cleans a sequence of frames and counts particles,
//! - `describe` segments the region around a seed pixel and prints its
//!   shape descriptor,
//! - `profile` prints the intensities along one row or column.
//!
//! # Usage
//!
//! ```text
//! cytoshape process cells.png -o binary.png --stage contrast=1.4 --stage threshold=120:binary
//! cytoshape count frame-*.png --stage threshold=128:binary-inv --stage erode=1 --json
//! cytoshape describe cells.png --seed 212,148 --predicate value --threshold 15 --overlay out.png
//! cytoshape profile cells.png --row 148
//! ```
//!
//! Set `RUST_LOG=debug` for per-stage logging from the core.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use cytoshape_core::profile::{self, Line};
use cytoshape_core::types::DynamicImage;
use cytoshape_core::{
    ElementShape, GrowthConfig, PipelineConfig, PixelPoint, PopulationTally, PredicateKind,
    ProcessingPipeline, Stage, ThresholdMode,
};

/// Region growing, particle counting and shape descriptors for microscopy
/// frames.
#[derive(Parser)]
#[command(name = "cytoshape", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a stage pipeline over an image and save the result.
    Process(ProcessArgs),
    /// Count particles in one or more frames.
    Count(CountArgs),
    /// Segment the region around a seed and describe its shape.
    Describe(DescribeArgs),
    /// Print the grayscale intensities along one row or column.
    Profile(ProfileArgs),
}

/// Stage pipeline options shared by `process` and `count`.
#[derive(Args)]
struct PipelineArgs {
    /// Pipeline stage, repeatable, applied in order.
    ///
    /// Forms: `contrast=G`, `linear=G:OFFSET`, `threshold=LEVEL[:MODE]`
    /// (MODE: binary, binary-inv, tozero, tozero-inv), `erode=R[:SHAPE]`,
    /// `dilate=R[:SHAPE]` (SHAPE: ellipse, rect, cross), `equalize`.
    #[arg(long = "stage", value_parser = parse_stage)]
    stages: Vec<Stage>,

    /// Upper bound on erode/dilate radii.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_MAX_ELEMENT_RADIUS)]
    max_element_radius: u8,

    /// Full pipeline config as a JSON string.
    ///
    /// When provided, `--stage` and `--max-element-radius` are ignored.
    /// The JSON must be a valid `PipelineConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,
}

#[derive(Args)]
struct ProcessArgs {
    /// Path to the input image (PNG, JPEG, BMP, WebP, TIFF).
    image_path: PathBuf,

    /// Where to write the processed image. The format follows the extension.
    #[arg(short, long)]
    output: PathBuf,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

#[derive(Args)]
struct CountArgs {
    /// Input frames, counted in the order given.
    #[arg(required = true)]
    image_paths: Vec<PathBuf>,

    #[command(flatten)]
    pipeline: PipelineArgs,

    /// Write `<stem>-particles.png` overlays into this directory.
    #[arg(long)]
    overlay_dir: Option<PathBuf>,

    /// Print the per-frame tally as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct DescribeArgs {
    /// Path to the input image (PNG, JPEG, BMP, WebP, TIFF).
    image_path: PathBuf,

    /// Seed pixel as `X,Y`.
    #[arg(long, value_parser = parse_seed)]
    seed: PixelPoint,

    /// Homogeneity threshold (strict upper bound on intensity distance).
    #[arg(long, default_value_t = GrowthConfig::DEFAULT_THRESHOLD)]
    threshold: i32,

    /// Homogeneity predicate.
    #[arg(long, value_enum, default_value_t = Predicate::Mean)]
    predicate: Predicate,

    /// Number of Fourier harmonics to report.
    #[arg(long, default_value_t = GrowthConfig::DEFAULT_HARMONICS)]
    harmonics: usize,

    /// Full growth config as a JSON string.
    ///
    /// When provided, `--threshold`, `--predicate` and `--harmonics` are
    /// ignored. The JSON must be a valid `GrowthConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,

    /// Write the frame with the contour and centroid drawn on it.
    #[arg(long)]
    overlay: Option<PathBuf>,

    /// Write the grown region as a binary mask (255 inside, 0 outside).
    #[arg(long)]
    mask: Option<PathBuf>,

    /// Print the full analysis as JSON instead of a summary.
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ProfileArgs {
    /// Path to the input image (PNG, JPEG, BMP, WebP, TIFF).
    image_path: PathBuf,

    /// Sample along row Y.
    #[arg(long, conflicts_with = "column", required_unless_present = "column")]
    row: Option<u32>,

    /// Sample along column X.
    #[arg(long)]
    column: Option<u32>,

    /// Print the profile as JSON.
    #[arg(long)]
    json: bool,
}

/// Homogeneity predicate selection.
#[derive(Clone, Copy, ValueEnum)]
enum Predicate {
    /// Distance to the running mean of evaluated pixels.
    Mean,
    /// Distance to the seed pixel's intensity.
    Value,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let result = match &cli.command {
        Command::Process(args) => run_process(args),
        Command::Count(args) => run_count(args),
        Command::Describe(args) => run_describe(args),
        Command::Profile(args) => run_profile(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("{msg}");
            ExitCode::FAILURE
        }
    }
}

fn run_process(args: &ProcessArgs) -> Result<(), String> {
    let pipeline = pipeline_from_cli(&args.pipeline)?;
    let frame = load_frame(&args.image_path)?;
    eprintln!(
        "Image: {} ({}x{}, {:?})",
        args.image_path.display(),
        frame.width(),
        frame.height(),
        frame.color(),
    );
    eprintln!("Stages: {:?}", pipeline.stages());

    let processed = pipeline
        .run(frame)
        .map_err(|e| format!("Pipeline error: {e}"))?;
    save_frame(&processed, &args.output)
}

fn run_count(args: &CountArgs) -> Result<(), String> {
    let pipeline = pipeline_from_cli(&args.pipeline)?;
    let mut tally = PopulationTally::new();

    for (index, path) in args.image_paths.iter().enumerate() {
        let frame = load_frame(path)?;
        let processed = pipeline
            .run(frame)
            .map_err(|e| format!("Pipeline error on {}: {e}", path.display()))?;
        let particles = cytoshape_core::count_particles(&processed)
            .map_err(|e| format!("Counting error on {}: {e}", path.display()))?;

        if !args.json {
            println!("{:>5}  {:>6}  {}", index, particles.count, path.display());
        }
        tally.record(index, particles.count);

        if let Some(ref dir) = args.overlay_dir {
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("frame");
            let overlay = cytoshape_core::overlay::draw_particle_overlay(&processed, &particles.contours);
            save_frame(
                &DynamicImage::ImageRgba8(overlay),
                &dir.join(format!("{stem}-particles.png")),
            )?;
        }
    }

    if args.json {
        let json = serde_json::to_string_pretty(&tally)
            .map_err(|e| format!("Error serializing tally: {e}"))?;
        println!("{json}");
    } else {
        println!(
            "min={}  max={}",
            tally.min().map_or_else(|| "-".to_owned(), |c| c.to_string()),
            tally.max().map_or_else(|| "-".to_owned(), |c| c.to_string()),
        );
    }
    Ok(())
}

fn run_describe(args: &DescribeArgs) -> Result<(), String> {
    let config = growth_config_from_cli(args)?;
    let frame = load_frame(&args.image_path)?;
    eprintln!("Config: {config:?}");

    let report = cytoshape_core::describe(&frame, args.seed, &config)
        .map_err(|e| format!("Analysis error: {e}"))?;
    let seg = &report.segmentation;
    let descriptor = &report.shape.descriptor;

    if args.json {
        let value = serde_json::json!({
            "seed": args.seed,
            "config": config,
            "region_area": seg.region.area(),
            "interior_area": seg.interior.area(),
            "contour_length": seg.contour.len(),
            "analysis": report.shape,
        });
        let json = serde_json::to_string_pretty(&value)
            .map_err(|e| format!("Error serializing analysis: {e}"))?;
        println!("{json}");
    } else {
        println!("Region:     {} px", seg.region.area());
        println!("Interior:   {} px", seg.interior.area());
        println!("Contour:    {} points", seg.contour.len());
        println!(
            "Centroid:   ({}, {})",
            report.shape.centroid.x, report.shape.centroid.y
        );
        println!("Variance:   {:.6}", descriptor.magnitude_variance);
        println!("Peaks:      {}", descriptor.peak_count);
        println!("Harmonics:");
        for (n, h) in descriptor.harmonics.iter().enumerate() {
            println!("  {n:>3}  {h:>12.6}");
        }
    }

    if let Some(ref path) = args.overlay {
        let overlay = cytoshape_core::overlay::draw_region_overlay(
            &frame,
            &seg.contour,
            report.shape.centroid,
        );
        save_frame(&DynamicImage::ImageRgba8(overlay), path)?;
    }

    if let Some(ref path) = args.mask {
        let mask = report.segmentation.region.into_image();
        save_frame(&DynamicImage::ImageLuma8(mask), path)?;
    }
    Ok(())
}

fn run_profile(args: &ProfileArgs) -> Result<(), String> {
    let line = profile_line(args)?;
    let frame = load_frame(&args.image_path)?;
    let gray = cytoshape_core::grayscale::to_grayscale(&frame);
    let profile = profile::sample(&gray, line).ok_or_else(|| {
        format!(
            "{line:?} is outside the {}x{} image",
            gray.width(),
            gray.height()
        )
    })?;

    if args.json {
        let json = serde_json::to_string_pretty(&profile)
            .map_err(|e| format!("Error serializing profile: {e}"))?;
        println!("{json}");
    } else {
        for (i, value) in profile.values.iter().enumerate() {
            println!("{i:>5}  {value:>3}");
        }
    }
    Ok(())
}

fn profile_line(args: &ProfileArgs) -> Result<Line, String> {
    match (args.row, args.column) {
        (Some(y), None) => Ok(Line::Row(y)),
        (None, Some(x)) => Ok(Line::Column(x)),
        _ => Err("give exactly one of --row or --column".to_owned()),
    }
}

/// Build a [`ProcessingPipeline`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and the
/// individual flags are ignored.
fn pipeline_from_cli(args: &PipelineArgs) -> Result<ProcessingPipeline, String> {
    let config = if let Some(ref json) = args.config_json {
        serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"))?
    } else {
        PipelineConfig {
            stages: args.stages.clone(),
            max_element_radius: args.max_element_radius,
        }
    };
    Ok(ProcessingPipeline::from_config(config))
}

/// Build a [`GrowthConfig`] from CLI arguments, with the same
/// `--config-json` precedence as [`pipeline_from_cli`].
fn growth_config_from_cli(args: &DescribeArgs) -> Result<GrowthConfig, String> {
    if let Some(ref json) = args.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }
    Ok(GrowthConfig {
        predicate: match args.predicate {
            Predicate::Mean => PredicateKind::MeanAdaptive,
            Predicate::Value => PredicateKind::SeedValue,
        },
        threshold: args.threshold,
        harmonics: args.harmonics,
    })
}

fn load_frame(path: &Path) -> Result<DynamicImage, String> {
    let bytes = std::fs::read(path).map_err(|e| format!("Error reading {}: {e}", path.display()))?;
    cytoshape_core::grayscale::decode(&bytes)
        .map_err(|e| format!("Error decoding {}: {e}", path.display()))
}

fn save_frame(frame: &DynamicImage, path: &Path) -> Result<(), String> {
    frame
        .save(path)
        .map_err(|e| format!("Error writing {}: {e}", path.display()))?;
    eprintln!("Written {}", path.display());
    Ok(())
}

/// Parse `X,Y` into a seed pixel.
fn parse_seed(s: &str) -> Result<PixelPoint, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got {s:?}"))?;
    let x = x.trim().parse().map_err(|e| format!("bad X in {s:?}: {e}"))?;
    let y = y.trim().parse().map_err(|e| format!("bad Y in {s:?}: {e}"))?;
    Ok(PixelPoint::new(x, y))
}

/// Parse a `--stage` value such as `threshold=128:binary` or `equalize`.
fn parse_stage(s: &str) -> Result<Stage, String> {
    let (name, params) = s.split_once('=').unwrap_or((s, ""));
    let mut parts = params.split(':').map(str::trim);
    let mut next = |what: &str| {
        parts
            .next()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| format!("stage {name:?} is missing its {what}"))
    };

    let stage = match name.trim() {
        "contrast" => Stage::Contrast {
            level: parse_number(next("level")?)?,
        },
        "linear" => Stage::Linear {
            gain: parse_number(next("gain")?)?,
            offset: parse_number(next("offset")?)?,
        },
        "threshold" => Stage::Threshold {
            level: parse_number(next("level")?)?,
            mode: next("mode").map_or(Ok(ThresholdMode::default()), parse_threshold_mode)?,
        },
        "erode" => Stage::Erode {
            radius: parse_number(next("radius")?)?,
            shape: next("shape").map_or(Ok(ElementShape::default()), parse_shape)?,
        },
        "dilate" => Stage::Dilate {
            radius: parse_number(next("radius")?)?,
            shape: next("shape").map_or(Ok(ElementShape::default()), parse_shape)?,
        },
        "equalize" => Stage::Equalize,
        other => return Err(format!("unknown stage {other:?}")),
    };
    stage
        .validate()
        .map_err(|e| format!("{} stage: {e}", stage.name()))?;
    Ok(stage)
}

fn parse_number<T>(s: &str) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    s.parse().map_err(|e| format!("bad number {s:?}: {e}"))
}

fn parse_threshold_mode(s: &str) -> Result<ThresholdMode, String> {
    match s {
        "binary" => Ok(ThresholdMode::Binary),
        "binary-inv" => Ok(ThresholdMode::BinaryInverted),
        "tozero" => Ok(ThresholdMode::ToZero),
        "tozero-inv" => Ok(ThresholdMode::ToZeroInverted),
        other => Err(format!("unknown threshold mode {other:?}")),
    }
}

fn parse_shape(s: &str) -> Result<ElementShape, String> {
    match s {
        "ellipse" => Ok(ElementShape::Ellipse),
        "rect" => Ok(ElementShape::Rect),
        "cross" => Ok(ElementShape::Cross),
        other => Err(format!("unknown element shape {other:?}")),
    }
}
