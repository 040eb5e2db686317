//! Run report written next to the results as `run_summary.json`.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use hazard_common::BoundingBox;
use hazard_engine::{HazardError, HazardSummary, RainfallMode};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// File name of the run report inside the mode results directory.
pub const REPORT_FILE: &str = "run_summary.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileStatus {
    Completed,
    Failed,
}

/// Outcome of one susceptibility tile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileReport {
    pub tile: String,
    pub source: String,
    pub status: TileStatus,
    pub elapsed_ms: u64,
    /// Extent of the susceptibility tile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extent: Option<BoundingBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rain_hazard_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hazard_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<HazardSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}

impl TileReport {
    pub fn failed(tile: &str, source: &Path, elapsed_ms: u64, error: &anyhow::Error) -> Self {
        let error_kind = error
            .chain()
            .find_map(|cause| cause.downcast_ref::<HazardError>())
            .map(|e| e.kind().to_string());

        Self {
            tile: tile.to_string(),
            source: source.display().to_string(),
            status: TileStatus::Failed,
            elapsed_ms,
            extent: None,
            rain_hazard_path: None,
            hazard_path: None,
            summary: None,
            error: Some(format!("{:#}", error)),
            error_kind,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == TileStatus::Failed
    }
}

/// Outcome of a whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub mode: RainfallMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rainfall_mm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rainfall_map: Option<String>,
    pub std_dev_mm: Option<f64>,
    pub tiles: Vec<TileReport>,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.tiles.iter().filter(|t| !t.is_failed()).count()
    }

    pub fn failed(&self) -> usize {
        self.tiles.iter().filter(|t| t.is_failed()).count()
    }

    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }

    /// Write the report as pretty JSON, creating the directory if needed.
    pub fn write_json(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create results directory {:?}", dir))?;
        let path = dir.join(REPORT_FILE);
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json).with_context(|| format!("Failed to write {:?}", path))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile(status: TileStatus) -> TileReport {
        TileReport {
            tile: "A1".to_string(),
            source: "data/A1_sus.asc".to_string(),
            status,
            elapsed_ms: 3,
            extent: None,
            rain_hazard_path: None,
            hazard_path: None,
            summary: None,
            error: None,
            error_kind: None,
        }
    }

    #[test]
    fn test_counts() {
        let now = Utc::now();
        let report = RunReport {
            started_at: now,
            finished_at: now,
            mode: RainfallMode::Constant,
            rainfall_mm: Some(100.0),
            rainfall_map: None,
            std_dev_mm: Some(20.0),
            tiles: vec![
                tile(TileStatus::Completed),
                tile(TileStatus::Failed),
                tile(TileStatus::Completed),
            ],
        };
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.duration_ms(), 0);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["mode"], "constant");
        assert_eq!(json["tiles"][1]["status"], "failed");
        assert!(json.get("rainfall_map").is_none());
    }

    #[test]
    fn test_failed_tile_records_kind() {
        let err: anyhow::Result<()> = Err(HazardError::invalid_parameter("std_dev_mm must be > 0"))
            .context("tile A1");
        let err = err.unwrap_err();

        let report = TileReport::failed("A1", Path::new("data/A1_sus.asc"), 1, &err);
        assert!(report.is_failed());
        assert_eq!(report.error_kind.as_deref(), Some("InvalidParameter"));
        assert!(report.error.unwrap().contains("std_dev_mm must be > 0"));
    }
}
