//! Error types for grid construction.

use thiserror::Error;

/// Result type alias using GridError.
pub type GridResult<T> = Result<T, GridError>;

/// Errors raised while building a [`crate::Grid`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    #[error("grid must have at least one row and one column (got {width}x{height})")]
    EmptyGrid { width: usize, height: usize },

    #[error("grid data has {actual} cells but {width}x{height} requires {expected}")]
    DataLength {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },

    #[error("invalid cell size ({cell_width}, {cell_height}): must be finite and non-zero")]
    InvalidCellSize { cell_width: f64, cell_height: f64 },

    #[error("invalid origin ({x}, {y}): must be finite")]
    InvalidOrigin { x: f64, y: f64 },

    #[error("invalid CRS identifier: {0}")]
    InvalidCrs(String),
}
