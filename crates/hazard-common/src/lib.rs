//! Common types shared across the landslide hazard crates.
//!
//! The central type is [`Grid`], a georeferenced raster of `f32` cells with a
//! nodata sentinel. Grids are immutable once built; every derived product is a
//! new grid sharing the geometry of its source.

pub mod bbox;
pub mod crs;
pub mod error;
pub mod grid;
pub mod transform;

pub use bbox::BoundingBox;
pub use crs::Crs;
pub use error::{GridError, GridResult};
pub use grid::{Grid, DEFAULT_NODATA};
pub use transform::GeoTransform;
