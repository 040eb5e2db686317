//! Rainfall-triggered landslide hazard engine.
//!
//! Turns a susceptibility grid and a 24 h rainfall accumulation into a
//! rainfall-hazard class grid and a combined landslide-hazard grid:
//!
//! ```text
//! susceptibility ─┐
//! rainfall ───────┼─► align check ─► rainfall classes ─► hazard matrix ─► outputs
//! std deviation ──┘                  (score vs. breaks)   (rain x susc)
//! ```
//!
//! The engine consumes decoded grids and never touches files, the network or
//! environment variables. Per-cell work is independent and runs on rayon in
//! row tiles; results are identical for any tile size or thread count.
//!
//! # Example
//!
//! ```ignore
//! use hazard_engine::{EngineConfig, HazardInputs, HazardPipeline};
//!
//! let pipeline = HazardPipeline::new(&EngineConfig::default())?;
//! let outputs = pipeline.run(&HazardInputs::constant(&susceptibility, 120.0, 35.0))?;
//! encode(&outputs.rain_hazard);
//! encode(&outputs.hazard);
//! ```

pub mod alignment;
pub mod classifier;
pub mod combiner;
pub mod config;
pub mod error;
pub mod matrix;
pub mod pipeline;
pub mod summary;
mod tiling;

// Re-export commonly used types at crate root
pub use alignment::{check_aligned, validate_alignment};
pub use classifier::{
    ClassBreaks, RainClass, RainfallClassifier, RainfallInput, RainfallVariability, GIRI_BREAKS,
};
pub use combiner::HazardCombiner;
pub use config::{ClassifierConfig, EngineConfig};
pub use error::{HazardError, Result};
pub use matrix::{HazardClass, HazardMatrix, MatrixConfig};
pub use pipeline::{
    HazardInputs, HazardOutputs, HazardPipeline, PipelineState, RainfallMode, ResolvedInputs,
};
pub use summary::{ClassHistogram, HazardSummary};
pub use tiling::DEFAULT_TILE_ROWS;
