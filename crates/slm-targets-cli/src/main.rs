//! slm-targets CLI — calibrate an SLM against a camera, map selected
//! targets into a pattern mask, and extract per-target traces from a stack.

use clap::{Args, Parser, Subcommand};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use slm_targets::{core, pipeline};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "slm-targets")]
#[command(about = "SLM targeting: two-point calibration, pattern masks, trace extraction")]
#[command(version)]
struct Cli {
    /// Verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit a two-point affine calibration and write the flat record.
    Calibrate(CalibrateArgs),

    /// Map targets through a calibration record and render the pattern mask.
    Map(MapArgs),

    /// Extract per-target traces from an image stack.
    Extract(ExtractArgs),
}

#[derive(Debug, Clone, Args)]
struct CalibrateArgs {
    /// JSON file with the two correspondence points per space:
    /// {"calibration": [[x,y],[x,y]], "camera": [[x,y],[x,y]]}.
    #[arg(long)]
    points: PathBuf,

    /// Pixel width of the camera image the points were selected in.
    #[arg(long)]
    camera_width: f64,

    /// Side length of the square SLM output pattern.
    #[arg(long, default_value = "213")]
    output_size: u32,

    /// Flip the rendered mask vertically at mapping time.
    #[arg(long)]
    flip_vertical: bool,

    /// Flip the rendered mask horizontally at mapping time.
    #[arg(long)]
    flip_horizontal: bool,

    /// Title written as the first header line of the record.
    #[arg(long, default_value = "SLM calibration file")]
    title: String,

    /// Path of the flat calibration record to write.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Debug, Clone, Args)]
struct MapArgs {
    /// Flat calibration record written by `calibrate`.
    #[arg(long)]
    calibration: PathBuf,

    /// JSON file with the selected targets: [[x,y], ...].
    #[arg(long)]
    targets: PathBuf,

    /// Height of the source image the targets were selected in.
    /// Exclusive with --source-image.
    #[arg(long, conflicts_with = "source_image")]
    source_height: Option<u32>,

    /// Source image to take the height from (must be square).
    #[arg(long)]
    source_image: Option<PathBuf>,

    /// Path to write the rendered mask (format from extension).
    #[arg(long)]
    mask_out: PathBuf,

    /// Optional path to write the mapped coordinates as JSON.
    #[arg(long)]
    mapped_out: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct ExtractArgs {
    /// Grayscale frame files, in stack order.
    #[arg(long, required = true, num_args = 1..)]
    frames: Vec<PathBuf>,

    /// JSON file with the selected targets: [[x,y], ...].
    #[arg(long)]
    targets: PathBuf,

    /// Window radius around each target, in pixels.
    #[arg(long, default_value = "2")]
    radius: i32,

    /// Number of window pixels summed per target and frame.
    #[arg(long, default_value = "25")]
    k: usize,

    /// Take the first k window cells instead of the k largest (cheaper,
    /// degraded mode).
    #[arg(long)]
    no_sort: bool,

    /// Also emit rows normalized into bands of this plot scale.
    #[arg(long)]
    plot_scale: Option<f64>,

    /// Path to write the trace report as JSON.
    #[arg(long)]
    out: PathBuf,
}

/// Correspondence points as selected by the user, pairing by index.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CalibratePoints {
    calibration: [[f64; 2]; 2],
    camera: [[f64; 2]; 2],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TraceReport {
    targets: usize,
    frames: usize,
    radius: i32,
    k: usize,
    sorted: bool,
    /// Stable per-target labels, row index order.
    labels: Vec<String>,
    /// Raw window sums, one row per target.
    matrix: Vec<Vec<f64>>,
    /// Plot-ready rows offset into disjoint bands, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    normalized: Option<Vec<Vec<f64>>>,
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    core::init_with_level(level)?;

    match cli.command {
        Commands::Calibrate(args) => run_calibrate(&args),
        Commands::Map(args) => run_map(&args),
        Commands::Extract(args) => run_extract(&args),
    }
}

fn load_targets(path: &PathBuf) -> CliResult<Vec<Point2<i32>>> {
    let raw = std::fs::read_to_string(path)?;
    let pts: Vec<[i32; 2]> = serde_json::from_str(&raw)?;
    Ok(pts.iter().map(|&[x, y]| Point2::new(x, y)).collect())
}

// ── calibrate ──────────────────────────────────────────────────────────

fn run_calibrate(args: &CalibrateArgs) -> CliResult<()> {
    let raw = std::fs::read_to_string(&args.points)?;
    let points: CalibratePoints = serde_json::from_str(&raw)?;

    let pair = core::CorrespondencePair::new(
        points.calibration.map(|[x, y]| Point2::new(x, y)),
        points.camera.map(|[x, y]| Point2::new(x, y)),
    );
    let record = core::calibrate(
        &pair,
        args.camera_width,
        args.output_size,
        args.flip_vertical,
        args.flip_horizontal,
    )?;

    log::info!(
        "scale ({:.4}, {:.4}), offset ({:.4}, {:.4})",
        record.scale_x,
        record.scale_y,
        record.offset_x,
        record.offset_y
    );

    record.write_flat(&args.out, &args.title)?;
    log::info!("calibration written to {}", args.out.display());
    Ok(())
}

// ── map ────────────────────────────────────────────────────────────────

fn source_height(args: &MapArgs) -> CliResult<u32> {
    if let Some(h) = args.source_height {
        return Ok(h);
    }
    let Some(path) = &args.source_image else {
        return Err("provide --source-height or --source-image".into());
    };
    let frame = pipeline::load_frame(path)?;
    if frame.width != frame.height {
        return Err(format!(
            "source image must be square, got {}x{}",
            frame.width, frame.height
        )
        .into());
    }
    Ok(frame.height as u32)
}

fn run_map(args: &MapArgs) -> CliResult<()> {
    let record = core::CalibrationRecord::read_flat(&args.calibration)?;
    let targets = load_targets(&args.targets)?;
    let height = source_height(args)?;

    let mapped = core::map_targets(&targets, &record, height)?;
    let mask = core::render_mask(
        &mapped,
        record.output_pattern_size as usize,
        record.flip_vertical,
        record.flip_horizontal,
    );
    pipeline::save_mask(&mask, &args.mask_out)?;
    log::info!(
        "mask of {} targets written to {}",
        mapped.len(),
        args.mask_out.display()
    );

    if let Some(out) = &args.mapped_out {
        let coords: Vec<[i32; 2]> = mapped.iter().map(|p| [p.x, p.y]).collect();
        std::fs::write(out, serde_json::to_string_pretty(&coords)?)?;
        log::info!("mapped coordinates written to {}", out.display());
    }
    Ok(())
}

// ── extract ────────────────────────────────────────────────────────────

fn run_extract(args: &ExtractArgs) -> CliResult<()> {
    let targets = load_targets(&args.targets)?;
    let stack = pipeline::load_stack(&args.frames)?;
    if stack.width() != stack.height() {
        return Err(format!(
            "stack frames must be square, got {}x{}",
            stack.width(),
            stack.height()
        )
        .into());
    }

    let params = core::ExtractionParams::new(args.radius, args.k, !args.no_sort)?;
    let builder = core::TraceBuilder::new(params);
    let matrix = builder.build(&stack, &targets)?;

    let normalized = match args.plot_scale {
        Some(scale) => {
            let mut plotted = matrix.clone();
            plotted.normalize_for_plot(scale)?;
            Some(plotted.rows().map(<[f64]>::to_vec).collect())
        }
        None => None,
    };

    let report = TraceReport {
        targets: matrix.targets(),
        frames: matrix.frames(),
        radius: params.radius(),
        k: params.k(),
        sorted: params.sort_before_selecting,
        labels: (0..matrix.targets()).map(|i| format!("target {i}")).collect(),
        matrix: matrix.rows().map(<[f64]>::to_vec).collect(),
        normalized,
    };
    std::fs::write(&args.out, serde_json::to_string_pretty(&report)?)?;
    log::info!(
        "{} traces over {} frames written to {}",
        report.targets,
        report.frames,
        args.out.display()
    );
    Ok(())
}
