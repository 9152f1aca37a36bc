//! # hubcast
//!
//! Command-line interface for turning point forecasts into probabilistic
//! hub submissions.

mod loader;

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use chrono::{Duration, NaiveDate};
use clap::{Args, Parser, Subcommand};
use quantile_facade::{
    validate_row, EstimatorRegistry, HubcastConfig, OutputType, OutputTypeId, RegistryBuilder,
    RowStatus, Season, TargetType, TrendCategory,
};
use serde::{Deserialize, Serialize};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Days between the reference date and the last reported observation.
const TRUTH_LAG_DAYS: i64 = 14;

#[derive(Parser)]
#[command(name = "hubcast")]
#[command(about = "Probabilistic hub submissions from point forecasts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a submission file from forecast history and current forecasts
    Submit(SubmitArgs),

    /// Fit estimators and report the calibrated transform and dispersion per pair
    Calibrate {
        /// Forecast history with truth values
        #[arg(short, long)]
        errors: PathBuf,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check an existing submission file against the hub contract
    Validate {
        /// Submission CSV
        #[arg(short, long)]
        input: PathBuf,

        /// Reference date (defaults to the date in the file name)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
}

#[derive(Args)]
struct SubmitArgs {
    /// Reference date (Saturday of the submission week)
    #[arg(short, long)]
    date: NaiveDate,

    /// Forecast history with truth values
    #[arg(short, long)]
    errors: PathBuf,

    /// Current point forecasts
    #[arg(short, long)]
    preds: PathBuf,

    /// Location codes and populations
    #[arg(short, long)]
    locations: PathBuf,

    /// Reported counts and rates; rate-change rows are skipped without it
    #[arg(short, long)]
    truth: Option<PathBuf>,

    /// Date of the last reported observation (default: 14 days before --date)
    #[arg(long)]
    truth_date: Option<NaiveDate>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Season whose dispersion is used (overrides config)
    #[arg(short, long)]
    season: Option<Season>,

    /// Team name (overrides config)
    #[arg(long)]
    team: Option<String>,

    /// Model name (overrides config)
    #[arg(short, long)]
    model: Option<String>,

    /// Directory for the submission file
    #[arg(short, long, default_value = "./final")]
    output: PathBuf,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hubcast=info,quantile_core=info".into()),
        )
        .init();
}

fn load_config(path: Option<&Path>) -> anyhow::Result<HubcastConfig> {
    match path {
        Some(path) => HubcastConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(HubcastConfig::default()),
    }
}

fn fit_registry(errors: &Path, config: &HubcastConfig) -> anyhow::Result<EstimatorRegistry> {
    let training = loader::load_training(errors)?;
    let registry = RegistryBuilder::new()
        .calibration(config.calibration.clone())
        .build(&training)?;
    if registry.is_empty() {
        bail!("No estimator could be fitted from {}", errors.display());
    }
    Ok(registry)
}

/// Run submit command
fn run_submit(args: SubmitArgs) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(season) = args.season {
        config.submission.season = season;
    }
    if let Some(team) = args.team {
        config.submission.team = team;
    }
    if let Some(model) = args.model {
        config.submission.model = model;
    }

    let registry = fit_registry(&args.errors, &config)?;
    let forecasts = loader::load_forecasts(&args.preds)?;

    let truth_date = args
        .truth_date
        .unwrap_or(args.date - Duration::days(TRUTH_LAG_DAYS));
    let truth = args.truth.as_deref().map(|path| (path, truth_date));
    let locations = loader::load_locations(&args.locations, truth)?;

    let mut writer = config.writer(args.date);
    let summary = config
        .pipeline(&registry)
        .run(&forecasts, &locations, &mut writer)?;

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;
    let path = writer.write_file(&args.output)?;

    println!("Submission written to {:?}", path);
    println!(
        "  {} quantile rows, {} pmf rows",
        summary.quantile_rows, summary.pmf_rows
    );
    println!(
        "  skipped: {} missing estimator, {} outside window, {} missing location",
        summary.missing_estimator, summary.out_of_window, summary.missing_location
    );
    if summary.missing_observation > 0 {
        println!(
            "  {} forecasts without rate-change rows (no last observation)",
            summary.missing_observation
        );
    }
    Ok(())
}

/// Per-pair calibration report
#[derive(Debug, Serialize)]
struct EstimatorReport {
    location: String,
    horizon: i32,
    transform: String,
    exponent: Option<f64>,
    samples: usize,
    std_devs: BTreeMap<String, f64>,
}

/// Run calibrate command
fn run_calibrate(
    errors: PathBuf,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let config = load_config(config.as_deref())?;
    let registry = fit_registry(&errors, &config)?;

    let reports: Vec<EstimatorReport> = registry
        .keys()
        .into_iter()
        .filter_map(|key| {
            registry.lookup(&key.location, key.horizon).map(|est| EstimatorReport {
                location: key.location.clone(),
                horizon: key.horizon,
                transform: est.transform().to_string(),
                exponent: est.transform().exponent(),
                samples: est.n_samples(),
                std_devs: est
                    .dispersion()
                    .seasons()
                    .filter_map(|s| est.dispersion().get(s).map(|sd| (s.to_string(), sd)))
                    .collect(),
            })
        })
        .collect();

    let json = serde_json::to_string_pretty(&reports)?;
    if let Some(path) = output {
        std::fs::write(&path, json).with_context(|| format!("Failed to write {:?}", path))?;
        println!("Calibration report written to {:?}", path);
    } else {
        println!("{}", json);
    }
    Ok(())
}

/// Submission row as read back from a file
#[derive(Debug, Deserialize)]
struct SubmittedRow {
    target: String,
    horizon: i32,
    target_end_date: NaiveDate,
    output_type: String,
    output_type_id: String,
}

fn parse_output_type_id(output_type: OutputType, id: &str) -> anyhow::Result<OutputTypeId> {
    Ok(match output_type {
        OutputType::Quantile => OutputTypeId::Quantile(
            id.parse()
                .with_context(|| format!("quantile level '{}' is not a number", id))?,
        ),
        OutputType::Pmf => OutputTypeId::Category(id.parse::<TrendCategory>()?),
    })
}

fn check_row(row: &SubmittedRow, reference_date: NaiveDate) -> anyhow::Result<RowStatus> {
    let target: TargetType = row.target.parse()?;
    let output_type: OutputType = row.output_type.parse()?;
    let id = parse_output_type_id(output_type, &row.output_type_id)?;
    Ok(validate_row(
        target,
        row.horizon,
        row.target_end_date,
        output_type,
        &id,
        reference_date,
    )?)
}

/// Reference date from a `{date}-{team}-{model}.csv` file name.
fn date_from_file_name(path: &Path) -> Option<NaiveDate> {
    let name = path.file_name()?.to_str()?;
    NaiveDate::parse_from_str(name.get(..10)?, "%Y-%m-%d").ok()
}

/// Run validate command
fn run_validate(input: PathBuf, date: Option<NaiveDate>) -> anyhow::Result<()> {
    let reference_date = match date.or_else(|| date_from_file_name(&input)) {
        Some(date) => date,
        None => bail!("No --date given and none found in file name {:?}", input),
    };

    let file = File::open(&input).with_context(|| format!("Failed to open {:?}", input))?;
    let mut reader = csv::Reader::from_reader(BufReader::new(file));

    let mut accepted = 0usize;
    let mut out_of_window = 0usize;
    let mut failures = Vec::new();
    for (i, result) in reader.deserialize::<SubmittedRow>().enumerate() {
        // Header is line 1
        let line = i + 2;
        let row = result.with_context(|| format!("Failed to read line {}", line))?;
        match check_row(&row, reference_date) {
            Ok(RowStatus::Accepted) => accepted += 1,
            Ok(RowStatus::OutOfWindow) => out_of_window += 1,
            Err(e) => failures.push(format!("line {}: {:#}", line, e)),
        }
    }

    println!("Reference date {}", reference_date);
    println!("  {} rows accepted, {} outside window", accepted, out_of_window);
    for failure in &failures {
        println!("  {}", failure);
    }
    if !failures.is_empty() {
        bail!("{} invalid rows", failures.len());
    }
    if out_of_window > 0 {
        tracing::warn!(out_of_window, "submission contains rows outside the window");
    }
    Ok(())
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Submit(args) => run_submit(args),
        Commands::Calibrate {
            errors,
            config,
            output,
        } => run_calibrate(errors, config, output),
        Commands::Validate { input, date } => run_validate(input, date),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
