//! Landslide hazard batch runner.
//!
//! Classifies 24 h rainfall against its variability, combines the rainfall
//! hazard with landslide susceptibility for every tile in the data directory
//! and writes the hazard grids and a run report.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use hazard_engine::RainfallMode;
use hazard_runner::{load_run_config, BatchRunner};

#[derive(Parser, Debug)]
#[command(name = "hazard-runner")]
#[command(about = "Rainfall-triggered landslide hazard for susceptibility tiles")]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "HAZARD_CONFIG", default_value = "config/hazard.yaml")]
    config: PathBuf,

    /// Rainfall mode: constant or map
    #[arg(short, long)]
    mode: Option<String>,

    /// Constant 24 h rainfall (mm)
    #[arg(long)]
    rain_mm: Option<f64>,

    /// Rainfall grid file name inside the data directory
    #[arg(long)]
    rain_map: Option<String>,

    /// Standard deviation of the maximum daily rainfall (mm)
    #[arg(long)]
    std_dev_mm: Option<f64>,

    /// Directory holding susceptibility tiles and rainfall grids
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Directory receiving the hazard grids
    #[arg(long)]
    results_dir: Option<PathBuf>,

    /// Process tiles one at a time
    #[arg(long)]
    sequential: bool,

    /// Maximum tiles processed at once
    #[arg(long)]
    max_threads: Option<usize>,

    /// Log level (overrides the config file)
    #[arg(long)]
    log_level: Option<String>,

    /// Log format: pretty or json (overrides the config file)
    #[arg(long)]
    log_format: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = load_run_config(&args.config)?;
    config.apply_env_overrides()?;

    if let Some(mode) = &args.mode {
        config.rainfall.mode = RainfallMode::parse(mode)
            .ok_or_else(|| anyhow::anyhow!("--mode must be 'constant' or 'map', got '{}'", mode))?;
    }
    if let Some(rain_mm) = args.rain_mm {
        config.rainfall.value_mm = Some(rain_mm);
    }
    if let Some(rain_map) = args.rain_map {
        config.rainfall.map = Some(rain_map);
    }
    if let Some(std_dev_mm) = args.std_dev_mm {
        config.rainfall.std_dev_mm = Some(std_dev_mm);
    }
    if let Some(data_dir) = args.data_dir {
        config.paths.data_dir = data_dir;
    }
    if let Some(results_dir) = args.results_dir {
        config.paths.results_dir = results_dir;
    }
    if args.sequential {
        config.processing.parallel = false;
    }
    if let Some(max_threads) = args.max_threads {
        config.processing.max_threads = max_threads;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    if let Some(format) = args.log_format {
        config.logging.format = format;
    }

    init_tracing(&config.logging.level, &config.logging.format)?;

    info!(
        config = %args.config.display(),
        mode = %config.rainfall.mode,
        data_dir = %config.paths.data_dir.display(),
        results_dir = %config.paths.results_dir.display(),
        "Starting hazard runner"
    );

    let runner = BatchRunner::new(config)?;
    let report = runner.run()?;

    if report.failed() > 0 {
        anyhow::bail!(
            "{} of {} tiles failed",
            report.failed(),
            report.tiles.len()
        );
    }

    Ok(())
}

fn init_tracing(level: &str, format: &str) -> Result<()> {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true);

    if format.eq_ignore_ascii_case("json") {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }

    Ok(())
}
