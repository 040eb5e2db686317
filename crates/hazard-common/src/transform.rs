//! Affine placement of a grid in its reference frame.

use serde::{Deserialize, Serialize};

use crate::bbox::BoundingBox;
use crate::error::GridError;

/// Relative tolerance used when comparing grid geometry.
///
/// Geometry that went through a decimal text round-trip still compares equal,
/// while a one-cell shift or a different resolution never does.
pub const GEOMETRY_TOLERANCE: f64 = 1e-9;

/// Axis-aligned geotransform (no rotation terms).
///
/// Cell `(col, row)` has its top-left corner at
/// `(origin_x + col * cell_width, origin_y + row * cell_height)`.
/// North-up rasters therefore have a negative `cell_height`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// X coordinate of the top-left corner of the top-left cell
    pub origin_x: f64,
    /// Y coordinate of the top-left corner of the top-left cell
    pub origin_y: f64,
    /// Cell size along X (columns)
    pub cell_width: f64,
    /// Cell size along Y (rows); negative for north-up data
    pub cell_height: f64,
}

impl GeoTransform {
    /// Create a transform, rejecting non-finite or zero cell sizes.
    pub fn new(
        origin_x: f64,
        origin_y: f64,
        cell_width: f64,
        cell_height: f64,
    ) -> Result<Self, GridError> {
        if !origin_x.is_finite() || !origin_y.is_finite() {
            return Err(GridError::InvalidOrigin {
                x: origin_x,
                y: origin_y,
            });
        }
        if !cell_width.is_finite()
            || !cell_height.is_finite()
            || cell_width == 0.0
            || cell_height == 0.0
        {
            return Err(GridError::InvalidCellSize {
                cell_width,
                cell_height,
            });
        }
        Ok(Self {
            origin_x,
            origin_y,
            cell_width,
            cell_height,
        })
    }

    /// North-up transform with square cells, anchored at the top-left corner.
    pub fn north_up(left: f64, top: f64, cell_size: f64) -> Result<Self, GridError> {
        Self::new(left, top, cell_size, -cell_size.abs())
    }

    /// Cell size as (|width|, |height|).
    pub fn cell_size(&self) -> (f64, f64) {
        (self.cell_width.abs(), self.cell_height.abs())
    }

    /// Extent covered by a `width` x `height` grid placed with this transform.
    pub fn extent(&self, width: usize, height: usize) -> BoundingBox {
        let x_end = self.origin_x + width as f64 * self.cell_width;
        let y_end = self.origin_y + height as f64 * self.cell_height;
        BoundingBox::new(
            self.origin_x.min(x_end),
            self.origin_y.min(y_end),
            self.origin_x.max(x_end),
            self.origin_y.max(y_end),
        )
    }
}

/// Compare two coordinates with [`GEOMETRY_TOLERANCE`] relative slack.
pub fn approx_eq(a: f64, b: f64) -> bool {
    let scale = 1.0_f64.max(a.abs()).max(b.abs());
    (a - b).abs() <= GEOMETRY_TOLERANCE * scale
}
