//! Configuration for the hazard engine.
//!
//! The engine reads no files and no environment variables; callers build an
//! [`EngineConfig`] (typically deserialized from their own configuration
//! file) and hand it to [`crate::HazardPipeline::new`] once.

use serde::{Deserialize, Serialize};

use crate::classifier::{ClassBreaks, RainfallClassifier, GIRI_BREAKS};
use crate::error::{HazardError, Result};
use crate::matrix::{HazardMatrix, MatrixConfig};
use crate::tiling::DEFAULT_TILE_ROWS;

/// Configuration for the hazard engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Rainfall hazard thresholds.
    pub classifier: ClassifierConfig,

    /// Hazard decision table.
    pub matrix: MatrixConfig,

    /// Grid rows per parallel work tile.
    pub tile_rows: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            classifier: ClassifierConfig::default(),
            matrix: MatrixConfig::default(),
            tile_rows: DEFAULT_TILE_ROWS,
        }
    }
}

impl EngineConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.tile_rows == 0 {
            return Err(HazardError::invalid_parameter("tile_rows must be > 0"));
        }

        let classifier = self.classifier.build()?;
        let matrix = HazardMatrix::from_config(&self.matrix)?;
        if matrix.rain_class_count() != classifier.class_count() {
            return Err(HazardError::invalid_matrix(format!(
                "table has {} rainfall-hazard rows but the classifier produces {} classes",
                matrix.rain_class_count(),
                classifier.class_count()
            )));
        }

        Ok(())
    }
}

/// Rainfall classifier settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Reference rainfall (mm) the standardized score is measured from.
    /// Ignored for cells covered by a mean-rainfall grid.
    pub baseline_mm: f64,

    /// Class breaks in standard deviations above the baseline.
    pub breaks: Vec<f64>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            baseline_mm: 0.0,
            breaks: GIRI_BREAKS.to_vec(),
        }
    }
}

impl ClassifierConfig {
    /// Build the validated classifier.
    pub fn build(&self) -> Result<RainfallClassifier> {
        RainfallClassifier::new(self.baseline_mm, ClassBreaks::new(self.breaks.clone())?)
    }
}
