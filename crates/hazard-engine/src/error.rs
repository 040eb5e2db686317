//! Error types for hazard computation.

use hazard_common::GridError;
use thiserror::Error;

/// Errors that abort a hazard run.
///
/// Every variant describes a structural defect of the inputs or the
/// configuration; none of them is retried. Per-cell nodata is never an error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HazardError {
    /// Two grids that must be combined cell by cell are not aligned.
    #[error("grid mismatch on {property}: expected {expected}, found {actual}")]
    GridMismatch {
        property: String,
        expected: String,
        actual: String,
    },

    /// A run parameter is missing or out of range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The hazard lookup table is incomplete or not monotonic.
    #[error("invalid hazard matrix: {0}")]
    InvalidHazardMatrix(String),

    /// A susceptibility cell holds a value that is not a declared class.
    #[error("susceptibility value {value} at cell ({col}, {row}) is not a known class")]
    UnknownSusceptibilityClass { value: f32, col: usize, row: usize },

    /// A derived grid could not be built.
    #[error(transparent)]
    InvalidGrid(#[from] GridError),
}

impl HazardError {
    /// Create a GridMismatch error.
    pub fn grid_mismatch(
        property: impl Into<String>,
        expected: impl ToString,
        actual: impl ToString,
    ) -> Self {
        Self::GridMismatch {
            property: property.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Create an InvalidParameter error.
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    /// Create an InvalidHazardMatrix error.
    pub fn invalid_matrix(msg: impl Into<String>) -> Self {
        Self::InvalidHazardMatrix(msg.into())
    }

    /// Short machine-readable kind, used in run reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::GridMismatch { .. } => "GridMismatch",
            Self::InvalidParameter(_) => "InvalidParameter",
            Self::InvalidHazardMatrix(_) => "InvalidHazardMatrix",
            Self::UnknownSusceptibilityClass { .. } => "UnknownSusceptibilityClass",
            Self::InvalidGrid(_) => "InvalidGrid",
        }
    }
}

/// Result type for hazard operations.
pub type Result<T> = std::result::Result<T, HazardError>;
