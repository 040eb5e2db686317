//! Run orchestration: validate, classify, combine.
//!
//! ```text
//! Validating ──► Classifying ──► Combining ──► Done(outputs)
//!     │               │               │
//!     └───────────────┴───────────────┴──────► Failed(error)
//! ```
//!
//! Transitions are strictly sequential and never retried. A failure in any
//! stage ends the run without outputs.

use std::fmt;
use std::time::Instant;

use hazard_common::Grid;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::alignment::validate_alignment;
use crate::classifier::{RainfallClassifier, RainfallInput, RainfallVariability};
use crate::combiner::HazardCombiner;
use crate::config::EngineConfig;
use crate::error::{HazardError, Result};
use crate::matrix::HazardMatrix;
use crate::summary::HazardSummary;

/// How the rainfall of a run is supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RainfallMode {
    /// One accumulation value applied to every cell.
    Constant,
    /// A rainfall accumulation grid.
    #[serde(alias = "input map")]
    Map,
}

impl RainfallMode {
    /// Parse from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "constant" => Some(Self::Constant),
            "map" | "input map" => Some(Self::Map),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Constant => "constant",
            Self::Map => "map",
        }
    }
}

impl fmt::Display for RainfallMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Everything one run consumes, as handed over by the decoding layer.
#[derive(Debug, Clone, Copy)]
pub struct HazardInputs<'a> {
    pub susceptibility: &'a Grid,
    pub mode: RainfallMode,
    /// Uniform 24 h rainfall (mm), required in constant mode.
    pub rainfall_mm: Option<f64>,
    /// Per-cell 24 h rainfall (mm), required in map mode.
    pub rainfall_grid: Option<&'a Grid>,
    /// Optional per-cell mean maximum daily rainfall (mm).
    pub mean_rainfall: Option<&'a Grid>,
    /// Standard deviation of the maximum daily rainfall (mm).
    pub std_dev_mm: Option<f64>,
}

impl<'a> HazardInputs<'a> {
    /// Inputs for a constant-rainfall run.
    pub fn constant(susceptibility: &'a Grid, rainfall_mm: f64, std_dev_mm: f64) -> Self {
        Self {
            susceptibility,
            mode: RainfallMode::Constant,
            rainfall_mm: Some(rainfall_mm),
            rainfall_grid: None,
            mean_rainfall: None,
            std_dev_mm: Some(std_dev_mm),
        }
    }

    /// Inputs for a rainfall-grid run.
    pub fn map(susceptibility: &'a Grid, rainfall: &'a Grid, std_dev_mm: f64) -> Self {
        Self {
            susceptibility,
            mode: RainfallMode::Map,
            rainfall_mm: None,
            rainfall_grid: Some(rainfall),
            mean_rainfall: None,
            std_dev_mm: Some(std_dev_mm),
        }
    }

    /// Use a per-cell mean rainfall grid instead of the configured baseline.
    pub fn with_mean_rainfall(mut self, mean_rainfall: &'a Grid) -> Self {
        self.mean_rainfall = Some(mean_rainfall);
        self
    }

    /// Check parameters and pick the rainfall source for the selected mode.
    pub fn resolve(&self) -> Result<ResolvedInputs<'a>> {
        let std_dev = self.std_dev_mm.ok_or_else(|| {
            HazardError::invalid_parameter("rainfall standard deviation is missing")
        })?;
        let variability = RainfallVariability::new(std_dev)?;

        let rainfall = match self.mode {
            RainfallMode::Constant => {
                let value = self.rainfall_mm.ok_or_else(|| {
                    HazardError::invalid_parameter("constant mode requires a rainfall value")
                })?;
                if !value.is_finite() || value < 0.0 {
                    return Err(HazardError::invalid_parameter(format!(
                        "constant rainfall must be a non-negative number of millimeters, got {}",
                        value
                    )));
                }
                RainfallInput::Constant(value)
            }
            RainfallMode::Map => {
                let grid = self.rainfall_grid.ok_or_else(|| {
                    HazardError::invalid_parameter("map mode requires a rainfall grid")
                })?;
                RainfallInput::Map(grid)
            }
        };

        Ok(ResolvedInputs {
            susceptibility: self.susceptibility,
            rainfall,
            mean_rainfall: self.mean_rainfall,
            variability,
        })
    }
}

/// Inputs after parameter checks, ready for classification.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedInputs<'a> {
    pub susceptibility: &'a Grid,
    pub rainfall: RainfallInput<'a>,
    pub mean_rainfall: Option<&'a Grid>,
    pub variability: RainfallVariability,
}

/// The two products of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct HazardOutputs {
    /// Rainfall-hazard class per cell.
    pub rain_hazard: Grid,
    /// Landslide hazard class per cell.
    pub hazard: Grid,
}

impl HazardOutputs {
    pub fn summary(&self) -> HazardSummary {
        HazardSummary::new(&self.rain_hazard, &self.hazard)
    }
}

/// State of a pipeline run.
#[derive(Debug)]
pub enum PipelineState<'a> {
    Validating,
    Classifying(ResolvedInputs<'a>),
    Combining {
        susceptibility: &'a Grid,
        rain_hazard: Grid,
    },
    Done(HazardOutputs),
    Failed(HazardError),
}

impl PipelineState<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Validating => "validating",
            Self::Classifying(_) => "classifying",
            Self::Combining { .. } => "combining",
            Self::Done(_) => "done",
            Self::Failed(_) => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done(_) | Self::Failed(_))
    }

    /// Outputs of a `Done` run, the error of a `Failed` one.
    pub fn into_result(self) -> Result<HazardOutputs> {
        match self {
            Self::Done(outputs) => Ok(outputs),
            Self::Failed(e) => Err(e),
            other => Err(HazardError::invalid_parameter(format!(
                "pipeline stopped before completion in state {}",
                other.name()
            ))),
        }
    }
}

/// Sequences validation, rainfall classification and hazard combination.
#[derive(Debug, Clone)]
pub struct HazardPipeline {
    classifier: RainfallClassifier,
    combiner: HazardCombiner,
    tile_rows: usize,
}

impl HazardPipeline {
    /// Validate the configuration and build the pipeline.
    pub fn new(config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        Self::from_parts(
            config.classifier.build()?,
            HazardMatrix::from_config(&config.matrix)?,
            config.tile_rows,
        )
    }

    /// Build from already constructed parts.
    pub fn from_parts(
        classifier: RainfallClassifier,
        matrix: HazardMatrix,
        tile_rows: usize,
    ) -> Result<Self> {
        if tile_rows == 0 {
            return Err(HazardError::invalid_parameter("tile_rows must be > 0"));
        }
        if matrix.rain_class_count() != classifier.class_count() {
            return Err(HazardError::invalid_matrix(format!(
                "table has {} rainfall-hazard rows but the classifier produces {} classes",
                matrix.rain_class_count(),
                classifier.class_count()
            )));
        }
        Ok(Self {
            classifier,
            combiner: HazardCombiner::new(matrix),
            tile_rows,
        })
    }

    pub fn classifier(&self) -> &RainfallClassifier {
        &self.classifier
    }

    pub fn matrix(&self) -> &HazardMatrix {
        self.combiner.matrix()
    }

    /// Run to completion and return the outputs or the first error.
    pub fn run(&self, inputs: &HazardInputs<'_>) -> Result<HazardOutputs> {
        self.execute(inputs).into_result()
    }

    /// Drive the state machine until it reaches `Done` or `Failed`.
    pub fn execute<'a>(&self, inputs: &HazardInputs<'a>) -> PipelineState<'a> {
        let started = Instant::now();
        let (width, height) = inputs.susceptibility.shape();
        info!(
            mode = %inputs.mode,
            width = width,
            height = height,
            "Starting hazard run"
        );

        let mut state = PipelineState::Validating;
        while !state.is_terminal() {
            let stage_started = Instant::now();
            let stage = state.name();
            state = self.step(state, inputs);
            debug!(
                from = stage,
                to = state.name(),
                elapsed_ms = stage_started.elapsed().as_millis() as u64,
                "Pipeline transition"
            );
        }

        match &state {
            PipelineState::Failed(e) => info!(
                error = %e,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Hazard run failed"
            ),
            _ => info!(
                cells = width * height,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Hazard run completed"
            ),
        }
        state
    }

    /// Advance one state.
    pub fn step<'a>(&self, state: PipelineState<'a>, inputs: &HazardInputs<'a>) -> PipelineState<'a> {
        match state {
            PipelineState::Validating => match self.validate(inputs) {
                Ok(resolved) => PipelineState::Classifying(resolved),
                Err(e) => PipelineState::Failed(e),
            },
            PipelineState::Classifying(resolved) => {
                match self.classifier.classify_grid(
                    resolved.susceptibility,
                    resolved.rainfall,
                    resolved.mean_rainfall,
                    resolved.variability,
                    self.tile_rows,
                ) {
                    Ok(rain_hazard) => PipelineState::Combining {
                        susceptibility: resolved.susceptibility,
                        rain_hazard,
                    },
                    Err(e) => PipelineState::Failed(e),
                }
            }
            PipelineState::Combining {
                susceptibility,
                rain_hazard,
            } => match self
                .combiner
                .combine(&rain_hazard, susceptibility, self.tile_rows)
            {
                Ok(hazard) => PipelineState::Done(HazardOutputs {
                    rain_hazard,
                    hazard,
                }),
                Err(e) => PipelineState::Failed(e),
            },
            terminal => terminal,
        }
    }

    /// Parameter and alignment checks; no cell is touched.
    fn validate<'a>(&self, inputs: &HazardInputs<'a>) -> Result<ResolvedInputs<'a>> {
        let resolved = inputs.resolve()?;
        self.check_nodata_sentinel(resolved.susceptibility.nodata())?;

        let mut spatial: Vec<(&str, &Grid)> = Vec::with_capacity(2);
        if let RainfallInput::Map(grid) = resolved.rainfall {
            spatial.push(("rainfall", grid));
        }
        if let Some(mean) = resolved.mean_rainfall {
            spatial.push(("mean rainfall", mean));
        }
        validate_alignment(resolved.susceptibility, &spatial)?;

        Ok(resolved)
    }

    /// Outputs reuse the susceptibility sentinel, so it must not collide with
    /// a rainfall class or a hazard class. NaN never collides.
    fn check_nodata_sentinel(&self, nodata: f32) -> Result<()> {
        let rain_class_clash = (1..=self.classifier.class_count()).any(|c| c as f32 == nodata);
        if rain_class_clash || self.matrix().produces(nodata) {
            return Err(HazardError::invalid_parameter(format!(
                "susceptibility nodata value {} is also a valid output class",
                nodata
            )));
        }
        Ok(())
    }
}
