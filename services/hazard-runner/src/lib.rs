//! Batch runner for rainfall-triggered landslide hazard.
//!
//! Reads susceptibility tiles and rainfall from ESRI ASCII grids, runs the
//! [`hazard_engine`] pipeline on each tile and writes the rainfall-hazard and
//! hazard grids plus a JSON run report.

pub mod ascii_grid;
pub mod batch;
pub mod config;
pub mod report;

pub use batch::{discover_tiles, BatchRunner, SharedInputs, TileJob};
pub use config::{load_run_config, parse_run_config, RunConfig};
pub use report::{RunReport, TileReport, TileStatus};
