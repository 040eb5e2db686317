//! Bounding box of a grid.

use serde::{Deserialize, Serialize};

/// Extent of a grid in its own reference frame.
///
/// For geographic CRS (EPSG:4326), coordinates are in degrees.
/// For projected CRS, coordinates are in the projection's units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }
}
