//! kinecal CLI: positioner calibration from probe measurements.
//!
//! Subcommands:
//! - `calibrate`: fit a calibration CSV and emit a positioner description
//! - `fk`: evaluate a described positioner at a configuration
//! - `check-vectors`: verify measurement vectors are unit length or zero

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

use kinecal_calib::{CalibrationEngine, CalibrationResult, ResidualKind, ResidualSummary};
use kinecal_core::config::KinecalConfig;
use kinecal_core::validation::validate_vector_length;
use kinecal_description::{
    CalibrationSetup, generate_description, read_instrument, to_json_string, write_json,
};
use kinecal_io::{read_calibration_file, read_vectors};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "kinecal")]
#[command(about = "Calibrate multi-joint positioners from probe measurements")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Calibrate a positioner and write its description.
    Calibrate(CalibrateArgs),

    /// Print the pose of a described positioner.
    Fk(FkArgs),

    /// Check measurement vectors are unit length or zero.
    CheckVectors {
        /// Measurement vector file (CSV).
        #[arg(long)]
        input: PathBuf,

        /// Configuration file (TOML).
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Args)]
struct CalibrateArgs {
    /// Calibration measurements (CSV: joint, x, y, z, offset, type, home).
    #[arg(long)]
    input: PathBuf,

    /// Name of the calibrated positioner.
    #[arg(long, default_value = "Positioner")]
    name: String,

    /// Joint names in kinematic order, comma separated.
    #[arg(long, value_delimiter = ',')]
    joint_names: Vec<String>,

    /// Display order as 1-based joint numbers, comma separated.
    #[arg(long, value_delimiter = ',')]
    order: Vec<usize>,

    /// Configuration file (TOML).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Description output path (JSON). Printed to stdout when omitted.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct FkArgs {
    /// Positioner or instrument description (JSON).
    #[arg(long)]
    description: PathBuf,

    /// Positioner to evaluate. Defaults to the first one described.
    #[arg(long)]
    positioner: Option<String>,

    /// Joint values in kinematic order, comma separated.
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    values: Vec<f64>,
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Calibrate(args) => run_calibrate(&args),
        Commands::Fk(args) => run_fk(&args),
        Commands::CheckVectors { input, config } => run_check_vectors(&input, config.as_deref()),
    }
}

fn load_config(path: Option<&Path>) -> CliResult<KinecalConfig> {
    match path {
        Some(path) => Ok(KinecalConfig::from_file(path)?),
        None => Ok(KinecalConfig::default()),
    }
}

// ---------------------------------------------------------------------------
// calibrate
// ---------------------------------------------------------------------------

fn run_calibrate(args: &CalibrateArgs) -> CliResult<()> {
    let config = load_config(args.config.as_deref())?;
    let data = read_calibration_file(&args.input)?;
    let engine = CalibrationEngine::new(config.calibration)?;
    let result = engine.calibrate(&data.measurements())?;
    print_summaries(&result, &data.indices);

    let mut setup = CalibrationSetup::new(
        args.name.as_str(),
        data.kinds.clone(),
        data.homes.clone(),
        data.offsets.clone(),
    );
    if !args.joint_names.is_empty() {
        setup = setup.with_names(args.joint_names.clone());
    }
    if !args.order.is_empty() {
        setup = setup.with_order(zero_based(&args.order)?);
    }
    let description = generate_description(&setup, &result)?;

    match &args.output {
        Some(path) => write_json(path, &description)?,
        None => println!("{}", to_json_string(&description)?),
    }
    Ok(())
}

fn zero_based(order: &[usize]) -> CliResult<Vec<usize>> {
    order
        .iter()
        .map(|&i| {
            i.checked_sub(1)
                .ok_or_else(|| CliError::from("joint numbers in --order start at 1"))
        })
        .collect()
}

fn format_summary(summary: &ResidualSummary) -> String {
    format!(
        "mean {:.4} max {:.4} ({} of {} over tolerance)",
        summary.mean, summary.max, summary.exceeding, summary.count
    )
}

fn print_summaries(result: &CalibrationResult, indices: &[usize]) {
    eprintln!("residual tolerance: {}", result.residual_tolerance());
    for (joint, index) in indices.iter().enumerate() {
        for (label, kind) in [("fit", ResidualKind::Fit), ("model", ResidualKind::Model)] {
            if let Some(summary) = result.summary(kind, Some(joint)) {
                eprintln!("joint {index} {label:>5}: {}", format_summary(&summary));
            }
        }
    }
    if let Some(summary) = result.summary(ResidualKind::Model, None) {
        eprintln!("overall model: {}", format_summary(&summary));
    }
}

// ---------------------------------------------------------------------------
// fk
// ---------------------------------------------------------------------------

fn run_fk(args: &FkArgs) -> CliResult<()> {
    let instrument = read_instrument(&args.description)?;
    let description = match &args.positioner {
        Some(name) => instrument.positioner(name)?,
        None => instrument
            .positioners
            .first()
            .ok_or_else(|| CliError::from("description has no positioners"))?,
    };
    let mut positioner = description.to_positioner()?;
    let pose = positioner.forward_kinematics(&args.values)?;

    let clamped = positioner.configuration();
    if clamped != args.values {
        tracing::warn!(requested = ?args.values, applied = ?clamped, "joint values clamped to limits");
    }
    for row in pose.row_iter() {
        println!(
            "{:>14.6} {:>14.6} {:>14.6} {:>14.6}",
            row[0], row[1], row[2], row[3]
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// check-vectors
// ---------------------------------------------------------------------------

fn run_check_vectors(input: &Path, config: Option<&Path>) -> CliResult<()> {
    let config = load_config(config)?;
    let vectors = read_vectors(input)?;
    let (points, columns, _) = vectors.shape();
    let tolerance = config.validation.vector_length_tolerance;
    if validate_vector_length(&vectors, tolerance) {
        println!(
            "{points} points, {} vectors each: all unit length or zero",
            columns / 3
        );
        Ok(())
    } else {
        Err(format!("measurement vectors must be unit length or zero (tolerance {tolerance})").into())
    }
}
