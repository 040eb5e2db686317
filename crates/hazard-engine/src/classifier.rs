//! Rainfall hazard classification.
//!
//! A 24 h accumulation is standardized against the historical maximum daily
//! rainfall of the area,
//!
//! ```text
//! score = (rainfall - baseline) / std_dev
//! ```
//!
//! and the score is placed within an ordered list of class breaks expressed in
//! standard deviations. With breaks `b_1 < b_2 < ... < b_k` the class is
//! `1 + #{ b_i : score >= b_i }`, so classes run from 1 to `k + 1` and a score
//! sitting exactly on a break falls into the higher class.

use hazard_common::Grid;
use tracing::debug;

use crate::alignment::check_aligned;
use crate::error::{HazardError, Result};
use crate::tiling::map_cells;

/// Ordinal rainfall-hazard class, starting at 1.
pub type RainClass = u8;

/// Class breaks used by the GIRI rainfall hazard: 0, 1, 2 and 3 standard
/// deviations above the mean maximum daily rainfall.
pub const GIRI_BREAKS: [f64; 4] = [0.0, 1.0, 2.0, 3.0];

/// Ordered, validated class breaks in standard-deviation units.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassBreaks(Vec<f64>);

impl ClassBreaks {
    /// Validate a list of breaks: non-empty, finite and strictly increasing.
    pub fn new(breaks: Vec<f64>) -> Result<Self> {
        if breaks.is_empty() {
            return Err(HazardError::invalid_parameter(
                "rainfall class breaks must not be empty",
            ));
        }
        if breaks.len() >= RainClass::MAX as usize {
            return Err(HazardError::invalid_parameter(format!(
                "too many rainfall class breaks ({})",
                breaks.len()
            )));
        }
        if let Some(b) = breaks.iter().find(|b| !b.is_finite()) {
            return Err(HazardError::invalid_parameter(format!(
                "rainfall class break {} is not finite",
                b
            )));
        }
        if let Some(pair) = breaks.windows(2).find(|w| w[0] >= w[1]) {
            return Err(HazardError::invalid_parameter(format!(
                "rainfall class breaks must be strictly increasing ({} >= {})",
                pair[0], pair[1]
            )));
        }
        Ok(Self(breaks))
    }

    /// Number of classes these breaks produce.
    pub fn class_count(&self) -> usize {
        self.0.len() + 1
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Class of a standardized score. Ties go to the higher class.
    pub fn classify(&self, score: f64) -> RainClass {
        // Breaks are sorted, so the count of breaks <= score is a partition point.
        let passed = self.0.partition_point(|b| *b <= score);
        (passed + 1) as RainClass
    }
}

impl Default for ClassBreaks {
    fn default() -> Self {
        Self(GIRI_BREAKS.to_vec())
    }
}

/// Standard deviation of the historical maximum daily rainfall (mm).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RainfallVariability(f64);

impl RainfallVariability {
    /// Reject missing, non-finite or non-positive values.
    pub fn new(std_dev_mm: f64) -> Result<Self> {
        if !std_dev_mm.is_finite() || std_dev_mm <= 0.0 {
            return Err(HazardError::invalid_parameter(format!(
                "rainfall standard deviation must be a positive number of millimeters, got {}",
                std_dev_mm
            )));
        }
        Ok(Self(std_dev_mm))
    }

    pub fn std_dev_mm(&self) -> f64 {
        self.0
    }
}

/// The rainfall of a run: one value for every cell, or a per-cell grid.
#[derive(Debug, Clone, Copy)]
pub enum RainfallInput<'a> {
    /// Uniform 24 h accumulation in millimeters.
    Constant(f64),
    /// Per-cell 24 h accumulation in millimeters, aligned with the susceptibility grid.
    Map(&'a Grid),
}

/// Turns rainfall accumulations into rainfall-hazard classes.
#[derive(Debug, Clone, PartialEq)]
pub struct RainfallClassifier {
    baseline_mm: f64,
    breaks: ClassBreaks,
}

impl RainfallClassifier {
    pub fn new(baseline_mm: f64, breaks: ClassBreaks) -> Result<Self> {
        if !baseline_mm.is_finite() {
            return Err(HazardError::invalid_parameter(format!(
                "rainfall baseline must be finite, got {}",
                baseline_mm
            )));
        }
        Ok(Self {
            baseline_mm,
            breaks,
        })
    }

    pub fn baseline_mm(&self) -> f64 {
        self.baseline_mm
    }

    pub fn breaks(&self) -> &ClassBreaks {
        &self.breaks
    }

    pub fn class_count(&self) -> usize {
        self.breaks.class_count()
    }

    /// Standardized exceedance of `rainfall_mm` over `baseline_mm`.
    #[inline]
    pub fn score(rainfall_mm: f64, baseline_mm: f64, variability: RainfallVariability) -> f64 {
        (rainfall_mm - baseline_mm) / variability.std_dev_mm()
    }

    /// Class of a single rainfall value against the configured baseline.
    pub fn classify_value(&self, rainfall_mm: f64, variability: RainfallVariability) -> RainClass {
        self.breaks
            .classify(Self::score(rainfall_mm, self.baseline_mm, variability))
    }

    /// Class of one cell; `None` if the rainfall or the baseline is missing.
    #[inline]
    pub fn classify_cell(
        &self,
        rainfall_mm: Option<f64>,
        baseline_mm: Option<f64>,
        variability: RainfallVariability,
    ) -> Option<RainClass> {
        let rainfall = rainfall_mm?;
        let baseline = baseline_mm?;
        Some(
            self.breaks
                .classify(Self::score(rainfall, baseline, variability)),
        )
    }

    /// Classify a whole grid.
    ///
    /// The output has the geometry of `susceptibility` and is nodata wherever
    /// the susceptibility, the rainfall or the mean rainfall is nodata. When a
    /// `mean_rainfall` grid is given it replaces the configured baseline cell
    /// by cell. Spatial inputs must already be aligned with `susceptibility`;
    /// they are re-checked here so the classifier is safe to call directly.
    pub fn classify_grid(
        &self,
        susceptibility: &Grid,
        rainfall: RainfallInput<'_>,
        mean_rainfall: Option<&Grid>,
        variability: RainfallVariability,
        tile_rows: usize,
    ) -> Result<Grid> {
        if let RainfallInput::Map(grid) = rainfall {
            check_aligned(susceptibility, grid, "rainfall")?;
        }
        if let Some(mean) = mean_rainfall {
            check_aligned(susceptibility, mean, "mean rainfall")?;
        }

        let nodata = susceptibility.nodata();
        let baseline_at = |index: usize| -> Option<f64> {
            match mean_rainfall {
                Some(mean) => mean.value_at(index).map(f64::from),
                None => Some(self.baseline_mm),
            }
        };

        let data = match (rainfall, mean_rainfall) {
            (RainfallInput::Constant(value), None) => {
                let class = f32::from(self.classify_value(value, variability));
                debug!(
                    rainfall_mm = value,
                    class = class,
                    "Broadcasting constant rainfall class"
                );
                map_cells(
                    susceptibility.width(),
                    susceptibility.height(),
                    tile_rows,
                    |i| {
                        Ok(match susceptibility.value_at(i) {
                            Some(_) => class,
                            None => nodata,
                        })
                    },
                )?
            }
            (RainfallInput::Constant(value), Some(_)) => map_cells(
                susceptibility.width(),
                susceptibility.height(),
                tile_rows,
                |i| {
                    let class = susceptibility
                        .value_at(i)
                        .and_then(|_| self.classify_cell(Some(value), baseline_at(i), variability));
                    Ok(class.map(f32::from).unwrap_or(nodata))
                },
            )?,
            (RainfallInput::Map(grid), _) => map_cells(
                susceptibility.width(),
                susceptibility.height(),
                tile_rows,
                |i| {
                    let class = susceptibility.value_at(i).and_then(|_| {
                        self.classify_cell(grid.value_at(i).map(f64::from), baseline_at(i), variability)
                    });
                    Ok(class.map(f32::from).unwrap_or(nodata))
                },
            )?,
        };

        Ok(susceptibility.with_data(data)?)
    }
}

impl Default for RainfallClassifier {
    fn default() -> Self {
        Self {
            baseline_mm: 0.0,
            breaks: ClassBreaks::default(),
        }
    }
}
