//! quiltpath: export quilting motion paths from the command line.
//!
//! Reads a preview payload written by the editor integration, turns it
//! into the path a long-arm quilting machine sews, and writes it in one
//! of the registered formats.
//!
//! # Usage
//!
//! ```text
//! quiltpath export preview.json --format DXF --output panto.dxf --entire-layout --repeats 4
//! quiltpath info preview.json --json
//! quiltpath formats
//! ```
//!
//! Set `RUST_LOG` to change the log level (default `info`).

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use quiltpath_export::{ExportOptions, PROFILES, Unit, profile};
use quiltpath_io::{export_to_file, load_payload};
use quiltpath_motion::{
    MotionConfig, MotionPath, OptimizerKind, PantographLayout, PathSummary, Point, compose,
    prepare_base, y_mismatch,
};
use tracing_subscriber::EnvFilter;

/// Quilting motion-path exporter.
#[derive(Parser)]
#[command(name = "quiltpath", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the motion path and write it to a file.
    Export {
        /// Preview payload JSON.
        input: PathBuf,

        /// Output format identifier (see `quiltpath formats`).
        #[arg(long, short, default_value = "DXF")]
        format: String,

        /// Destination file. The extension is corrected to the format's.
        #[arg(long, short)]
        output: PathBuf,

        #[command(flatten)]
        motion: MotionArgs,
    },

    /// Print a summary of the motion path.
    Info {
        /// Preview payload JSON.
        input: PathBuf,

        #[command(flatten)]
        motion: MotionArgs,

        /// Output the summary as JSON instead of a report.
        #[arg(long)]
        json: bool,
    },

    /// List the available output formats.
    Formats,
}

/// Flags that shape the motion path.
#[derive(Args)]
struct MotionArgs {
    /// Compose the whole pantograph instead of the single pattern.
    #[arg(long)]
    entire_layout: bool,

    /// Copies per row.
    #[arg(long, default_value_t = PantographLayout::DEFAULT_REPEATS)]
    repeats: u32,

    /// Number of rows.
    #[arg(long, default_value_t = PantographLayout::DEFAULT_ROWS)]
    rows: u32,

    /// Vertical distance between rows in millimetres.
    ///
    /// Defaults to the pattern height, so rows sit flush.
    #[arg(long)]
    row_spacing: Option<f64>,

    /// Shift odd rows sideways.
    #[arg(long)]
    stagger: bool,

    /// Odd-row shift as a percentage of the pattern pitch (0-100).
    #[arg(long, default_value_t = PantographLayout::DEFAULT_STAGGER_PERCENT)]
    stagger_percent: f64,

    /// Mirror odd rows left-to-right.
    #[arg(long)]
    mirror_rows_h: bool,

    /// Mirror odd rows top-to-bottom.
    #[arg(long)]
    mirror_rows_v: bool,

    /// Mirror every copy left-to-right.
    #[arg(long)]
    flip_h: bool,

    /// Mirror every copy top-to-bottom.
    #[arg(long)]
    flip_v: bool,

    /// Optimize the base pattern before tiling.
    #[arg(long, value_enum)]
    optimize: Option<Optimizer>,

    /// Full motion config as a JSON string.
    ///
    /// When provided, all other motion flags are ignored. The JSON must
    /// be a valid `MotionConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,
}

/// Optimization strategy selection.
#[derive(Clone, Copy, ValueEnum)]
enum Optimizer {
    /// Remove self-crossings with 2-opt reversals.
    Uncross,
    /// Drop avoidable retraced stretches.
    Reroute,
}

impl From<Optimizer> for OptimizerKind {
    fn from(value: Optimizer) -> Self {
        match value {
            Optimizer::Uncross => Self::Uncross,
            Optimizer::Reroute => Self::Reroute,
        }
    }
}

/// Optimizer selected by `--config-json` or `--optimize`.
fn optimizer_from_args(args: &MotionArgs) -> Result<Option<OptimizerKind>, String> {
    if args.config_json.is_some() {
        Ok(config_from_args(args, None)?.optimizer)
    } else {
        Ok(args.optimize.map(OptimizerKind::from))
    }
}

/// Build a [`MotionConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual flags are ignored. Otherwise an unset `--row-spacing`
/// falls back to the height of `base`.
fn config_from_args(
    args: &MotionArgs,
    base: Option<&MotionPath>,
) -> Result<MotionConfig, String> {
    if let Some(ref json) = args.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    let row_spacing_mm = match (args.row_spacing, base) {
        (Some(spacing), _) => spacing,
        (None, Some(base)) => PantographLayout::for_pattern(base).row_spacing_mm,
        (None, None) => PantographLayout::DEFAULT_ROW_SPACING_MM,
    };

    Ok(MotionConfig {
        layout: PantographLayout {
            repeats: args.repeats,
            rows: args.rows,
            row_spacing_mm,
            stagger: args.stagger,
            stagger_percent: args.stagger_percent,
            mirror_every_other_row_h: args.mirror_rows_h,
            mirror_every_other_row_v: args.mirror_rows_v,
            flip_h: args.flip_h,
            flip_v: args.flip_v,
        },
        optimizer: args.optimize.map(OptimizerKind::from),
        export_entire_layout: args.entire_layout,
    })
}

/// The base pattern and the path that gets exported.
struct Built {
    base: MotionPath,
    path: MotionPath,
    config: MotionConfig,
}

/// Run the motion pipeline on already-loaded sub-paths.
///
/// The anchor check runs on the base pattern: a composed layout ends a
/// row lower than it starts whenever there is more than one row.
fn build_from_subpaths(subpaths: &[Vec<Point>], args: &MotionArgs) -> Result<Built, String> {
    let base = prepare_base(subpaths, optimizer_from_args(args)?)
        .map_err(|e| format!("Pipeline error: {e}"))?;
    if let Some(dy) = y_mismatch(&base) {
        tracing::warn!(
            dy_mm = dy,
            "start and end anchors differ in Y; tiled rows will not line up"
        );
    }

    let config = config_from_args(args, Some(&base))?;
    let path = compose(&base, &config).map_err(|e| format!("Pipeline error: {e}"))?;
    Ok(Built { base, path, config })
}

/// Load the payload and run the motion pipeline.
fn build_path(input: &Path, args: &MotionArgs) -> Result<Built, String> {
    let payload = load_payload(input).map_err(|e| e.to_string())?;
    build_from_subpaths(&payload.subpaths_mm(), args)
}

/// `output` with its extension replaced by `extension` if it differs.
fn with_extension(output: &Path, extension: &str) -> PathBuf {
    let matches = output
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension));
    if matches {
        output.to_path_buf()
    } else {
        output.with_extension(extension)
    }
}

fn run_export(
    input: &Path,
    format: &str,
    output: &Path,
    args: &MotionArgs,
) -> Result<(), String> {
    let profile = profile(format).map_err(|e| e.to_string())?;
    let Built { path, config, .. } = build_path(input, args)?;

    let dest = with_extension(output, profile.extension);
    if dest != output {
        tracing::info!(
            requested = %output.display(),
            corrected = %dest.display(),
            "corrected file extension"
        );
    }

    let options = ExportOptions {
        unit: Unit::Millimetre,
        export_entire_layout: config.export_entire_layout,
    };
    let bytes = export_to_file(&path, profile, &options, &dest).map_err(|e| e.to_string())?;
    eprintln!(
        "{} written to {} ({bytes} bytes, {} segments)",
        profile.title,
        dest.display(),
        path.len(),
    );
    Ok(())
}

fn run_info(input: &Path, args: &MotionArgs, json: bool) -> Result<(), String> {
    let Built { base, path, .. } = build_path(input, args)?;
    let summary = PathSummary::of_layout(&base, &path);
    if json {
        let text = serde_json::to_string_pretty(&summary)
            .map_err(|e| format!("Error serializing summary: {e}"))?;
        println!("{text}");
    } else {
        println!("{}", summary.report());
    }
    Ok(())
}

fn run_formats() {
    println!("{:<6} {:<6} Description", "ID", "Ext");
    println!("{}", "-".repeat(60));
    for p in PROFILES {
        println!("{:<6} {:<6} {}", p.id, p.extension, p.description);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let result = match &cli.command {
        Command::Export {
            input,
            format,
            output,
            motion,
        } => run_export(input, format, output, motion),
        Command::Info {
            input,
            motion,
            json,
        } => run_info(input, motion, *json),
        Command::Formats => {
            run_formats();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("{msg}");
            ExitCode::FAILURE
        }
    }
}
