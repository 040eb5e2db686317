//! Batch processing of susceptibility tiles.
//!
//! A run discovers every `<prefix>_sus.asc` tile in the data directory,
//! computes the rainfall hazard and landslide hazard for each tile, and writes
//!
//! ```text
//! <results_dir>/<mode>/RainHazard/<prefix>_RainHazard.asc
//! <results_dir>/<mode>/Hazard/<prefix>_Hazard.asc
//! <results_dir>/<mode>/run_summary.json
//! ```
//!
//! Tiles are independent. A failing tile is logged and reported; the other
//! tiles still run.

use anyhow::{Context, Result};
use chrono::Utc;
use hazard_common::Grid;
use hazard_engine::{HazardInputs, HazardPipeline};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::ascii_grid::{read_ascii_grid, write_ascii_grid};
use crate::config::RunConfig;
use crate::report::{RunReport, TileReport, TileStatus};

pub const RAIN_HAZARD_DIR: &str = "RainHazard";
pub const HAZARD_DIR: &str = "Hazard";

/// One susceptibility tile to process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileJob {
    /// Tile prefix, e.g. `A1` for `A1_sus.asc`
    pub name: String,
    pub path: PathBuf,
}

/// Find susceptibility tiles directly inside `data_dir`, sorted by file name.
pub fn discover_tiles(data_dir: &Path, suffix: &str) -> Result<Vec<TileJob>> {
    let mut jobs = Vec::new();

    for entry in WalkDir::new(data_dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry =
            entry.with_context(|| format!("Failed to list data directory {:?}", data_dir))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy();
        if let Some(name) = tile_prefix(&file_name, suffix) {
            jobs.push(TileJob {
                name: name.to_string(),
                path: entry.path().to_path_buf(),
            });
        }
    }

    Ok(jobs)
}

/// Tile prefix of a susceptibility file name, `None` if it is not a tile.
///
/// The prefix is the file name up to the first `_`.
pub fn tile_prefix<'a>(file_name: &'a str, suffix: &str) -> Option<&'a str> {
    file_name.strip_suffix(suffix)?;
    file_name
        .split('_')
        .next()
        .filter(|prefix| !prefix.is_empty() && *prefix != file_name)
}

/// Prefixes claimed by more than one tile.
///
/// Such tiles would write the same output files, so none of them is run.
pub fn duplicate_prefixes(jobs: &[TileJob]) -> BTreeSet<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for job in jobs {
        *counts.entry(job.name.as_str()).or_default() += 1;
    }
    counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(name, _)| name.to_string())
        .collect()
}

/// Rainfall grids shared by every tile of a run.
#[derive(Debug, Default)]
pub struct SharedInputs {
    pub rainfall: Option<Grid>,
    pub mean_rainfall: Option<Grid>,
}

/// Runs the hazard pipeline over all tiles of a data directory.
pub struct BatchRunner {
    config: RunConfig,
    pipeline: HazardPipeline,
}

impl BatchRunner {
    /// Validate the configuration and build the pipeline.
    pub fn new(config: RunConfig) -> Result<Self> {
        config.validate()?;
        let pipeline =
            HazardPipeline::new(&config.engine).context("Failed to build hazard pipeline")?;
        Ok(Self { config, pipeline })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Load the rainfall map (map mode) and mean rainfall grid, if configured.
    pub fn load_shared_inputs(&self) -> Result<SharedInputs> {
        let rainfall = &self.config.rainfall;
        let mut shared = SharedInputs::default();

        if rainfall.mode == hazard_engine::RainfallMode::Map {
            if let Some(name) = &rainfall.map {
                let path = self.config.paths.data_dir.join(name);
                let grid = read_ascii_grid(&path, &self.config.default_crs)
                    .with_context(|| format!("Failed to read rainfall map {:?}", path))?;
                info!(path = %path.display(), width = grid.width(), height = grid.height(), "Loaded rainfall map");
                shared.rainfall = Some(grid);
            }
        }

        if let Some(name) = &rainfall.mean_map {
            let path = self.config.paths.data_dir.join(name);
            let grid = read_ascii_grid(&path, &self.config.default_crs)
                .with_context(|| format!("Failed to read mean rainfall map {:?}", path))?;
            info!(path = %path.display(), "Loaded mean rainfall map");
            shared.mean_rainfall = Some(grid);
        }

        Ok(shared)
    }

    /// Output paths `(rain hazard, hazard)` of a tile.
    pub fn output_paths(&self, tile: &str) -> (PathBuf, PathBuf) {
        let base = self.config.mode_results_dir();
        (
            base.join(RAIN_HAZARD_DIR)
                .join(format!("{}_RainHazard.asc", tile)),
            base.join(HAZARD_DIR).join(format!("{}_Hazard.asc", tile)),
        )
    }

    /// Process every discovered tile and write the run report.
    ///
    /// Fails only when the run cannot start (bad data directory, unreadable
    /// shared rainfall, thread pool); per-tile failures are in the report.
    pub fn run(&self) -> Result<RunReport> {
        let started_at = Utc::now();
        let paths = &self.config.paths;

        let jobs = discover_tiles(&paths.data_dir, &self.config.processing.tile_suffix)?;
        if jobs.is_empty() {
            warn!(data_dir = %paths.data_dir.display(), "No susceptibility tiles found");
        } else {
            info!(
                tiles = jobs.len(),
                mode = %self.config.rainfall.mode,
                parallel = self.config.processing.parallel,
                "Starting hazard run"
            );
        }

        let duplicates = duplicate_prefixes(&jobs);
        if !duplicates.is_empty() {
            warn!(prefixes = ?duplicates, "Tiles share an output prefix and will be skipped");
        }

        let shared = self.load_shared_inputs()?;

        let tiles: Vec<TileReport> = if self.config.processing.parallel && jobs.len() > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.processing.max_threads)
                .thread_name(|i| format!("hazard-tile-{}", i))
                .build()
                .context("Failed to build tile thread pool")?;
            pool.install(|| {
                jobs.par_iter()
                    .map(|job| self.run_tile(job, &shared, &duplicates))
                    .collect()
            })
        } else {
            jobs.iter()
                .map(|job| self.run_tile(job, &shared, &duplicates))
                .collect()
        };

        let report = RunReport {
            started_at,
            finished_at: Utc::now(),
            mode: self.config.rainfall.mode,
            rainfall_mm: self.config.rainfall.value_mm,
            rainfall_map: self.config.rainfall.map.clone(),
            std_dev_mm: self.config.rainfall.std_dev_mm,
            tiles,
        };

        report.write_json(&self.config.mode_results_dir())?;

        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            duration_ms = report.duration_ms(),
            "Hazard run finished"
        );

        Ok(report)
    }

    fn run_tile(
        &self,
        job: &TileJob,
        shared: &SharedInputs,
        duplicates: &BTreeSet<String>,
    ) -> TileReport {
        let start = Instant::now();
        let result = if duplicates.contains(&job.name) {
            Err(anyhow::anyhow!(
                "tile prefix '{}' is shared by several susceptibility files",
                job.name
            ))
        } else {
            self.process_tile(job, shared)
        };

        match result {
            Ok(mut report) => {
                report.elapsed_ms = start.elapsed().as_millis() as u64;
                report
            }
            Err(e) => {
                warn!(tile = %job.name, error = %format!("{:#}", e), "Tile failed");
                TileReport::failed(
                    &job.name,
                    &job.path,
                    start.elapsed().as_millis() as u64,
                    &e,
                )
            }
        }
    }

    /// Compute and write the outputs of one tile.
    pub fn process_tile(&self, job: &TileJob, shared: &SharedInputs) -> Result<TileReport> {
        debug!(tile = %job.name, path = %job.path.display(), "Processing tile");

        let susceptibility = read_ascii_grid(&job.path, &self.config.default_crs)
            .with_context(|| format!("Failed to read susceptibility tile {:?}", job.path))?;

        let rainfall = &self.config.rainfall;
        let inputs = HazardInputs {
            susceptibility: &susceptibility,
            mode: rainfall.mode,
            rainfall_mm: rainfall.value_mm,
            rainfall_grid: shared.rainfall.as_ref(),
            mean_rainfall: shared.mean_rainfall.as_ref(),
            std_dev_mm: rainfall.std_dev_mm,
        };

        let outputs = self
            .pipeline
            .run(&inputs)
            .with_context(|| format!("Hazard computation failed for tile {}", job.name))?;

        let (rain_path, hazard_path) = self.output_paths(&job.name);
        write_ascii_grid(&rain_path, &outputs.rain_hazard)
            .with_context(|| format!("Failed to write {:?}", rain_path))?;
        write_ascii_grid(&hazard_path, &outputs.hazard)
            .with_context(|| format!("Failed to write {:?}", hazard_path))?;

        let summary = outputs.summary();
        info!(
            tile = %job.name,
            cells = summary.cells(),
            max_hazard = ?summary.hazard.max_class(),
            nodata = summary.hazard.nodata,
            "Tile completed"
        );

        Ok(TileReport {
            tile: job.name.clone(),
            source: job.path.display().to_string(),
            status: TileStatus::Completed,
            elapsed_ms: 0,
            extent: Some(susceptibility.extent()),
            rain_hazard_path: Some(rain_path.display().to_string()),
            hazard_path: Some(hazard_path.display().to_string()),
            summary: Some(summary),
            error: None,
            error_kind: None,
        })
    }
}
