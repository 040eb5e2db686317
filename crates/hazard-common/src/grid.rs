//! Georeferenced raster grids.

use crate::bbox::BoundingBox;
use crate::crs::Crs;
use crate::error::{GridError, GridResult};
use crate::transform::GeoTransform;

/// Nodata sentinel used when a source does not declare one.
pub const DEFAULT_NODATA: f32 = -9999.0;

/// A rectangular, georeferenced raster of `f32` cells.
///
/// Data is stored row-major, top row first: cell `(col, row)` lives at
/// `row * width + col`. A cell is nodata when it equals the sentinel or is
/// NaN. Grids are immutable; derived products are built with
/// [`Grid::with_data`] and share this grid's geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    data: Vec<f32>,
    width: usize,
    height: usize,
    transform: GeoTransform,
    crs: Crs,
    nodata: f32,
}

impl Grid {
    /// Build a grid, checking that the data fills the declared shape.
    pub fn new(
        data: Vec<f32>,
        width: usize,
        height: usize,
        transform: GeoTransform,
        crs: Crs,
        nodata: f32,
    ) -> GridResult<Self> {
        if width == 0 || height == 0 {
            return Err(GridError::EmptyGrid { width, height });
        }
        let expected = width * height;
        if data.len() != expected {
            return Err(GridError::DataLength {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            transform,
            crs,
            nodata,
        })
    }

    /// Grid with every cell set to `value`.
    pub fn filled(
        width: usize,
        height: usize,
        transform: GeoTransform,
        crs: Crs,
        nodata: f32,
        value: f32,
    ) -> GridResult<Self> {
        Self::new(
            vec![value; width * height],
            width,
            height,
            transform,
            crs,
            nodata,
        )
    }

    /// New grid with this grid's geometry, CRS and nodata sentinel.
    pub fn with_data(&self, data: Vec<f32>) -> GridResult<Self> {
        Self::new(
            data,
            self.width,
            self.height,
            self.transform,
            self.crs.clone(),
            self.nodata,
        )
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// (width, height)
    pub fn shape(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false for a constructed grid; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    pub fn nodata(&self) -> f32 {
        self.nodata
    }

    /// Raw cell values, row-major.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    /// Raw values of one row.
    pub fn row(&self, row: usize) -> Option<&[f32]> {
        if row >= self.height {
            return None;
        }
        let start = row * self.width;
        Some(&self.data[start..start + self.width])
    }

    /// Extent covered by the grid.
    pub fn extent(&self) -> BoundingBox {
        self.transform.extent(self.width, self.height)
    }

    /// Check a raw value against this grid's nodata sentinel.
    #[inline]
    pub fn is_nodata(&self, value: f32) -> bool {
        value.is_nan() || value == self.nodata
    }

    /// Raw value at `(col, row)`, including nodata sentinels.
    pub fn get(&self, col: usize, row: usize) -> Option<f32> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.data.get(row * self.width + col).copied()
    }

    /// Valid value at `(col, row)`; `None` for nodata or out of range.
    pub fn value(&self, col: usize, row: usize) -> Option<f32> {
        self.get(col, row).filter(|v| !self.is_nodata(*v))
    }

    /// Valid value at a flat index; `None` for nodata or out of range.
    #[inline]
    pub fn value_at(&self, index: usize) -> Option<f32> {
        self.data.get(index).copied().filter(|v| !self.is_nodata(*v))
    }

    /// Number of nodata cells.
    pub fn nodata_count(&self) -> usize {
        self.data.iter().filter(|v| self.is_nodata(**v)).count()
    }

    /// Bitwise equality of geometry and cell values (NaN-safe).
    pub fn bit_eq(&self, other: &Grid) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.transform == other.transform
            && self.crs == other.crs
            && self.nodata.to_bits() == other.nodata.to_bits()
            && self
                .data
                .iter()
                .zip(other.data.iter())
                .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}
