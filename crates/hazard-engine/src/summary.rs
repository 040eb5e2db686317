//! Per-class cell counts of hazard outputs.

use std::collections::BTreeMap;

use hazard_common::Grid;
use serde::{Deserialize, Serialize};

/// Cell counts of a classified grid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassHistogram {
    /// Number of nodata cells.
    pub nodata: usize,
    /// Cells per class value.
    pub classes: BTreeMap<u16, usize>,
}

impl ClassHistogram {
    /// Count the classes of a grid whose valid cells hold whole class values.
    pub fn from_grid(grid: &Grid) -> Self {
        let mut histogram = Self::default();
        for &value in grid.data() {
            if grid.is_nodata(value) {
                histogram.nodata += 1;
            } else {
                *histogram.classes.entry(value as u16).or_insert(0) += 1;
            }
        }
        histogram
    }

    /// Number of cells holding a class.
    pub fn valid(&self) -> usize {
        self.classes.values().sum()
    }

    /// Highest class present, if any cell is valid.
    pub fn max_class(&self) -> Option<u16> {
        self.classes.keys().next_back().copied()
    }
}

/// Summary of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HazardSummary {
    pub width: usize,
    pub height: usize,
    pub rain_hazard: ClassHistogram,
    pub hazard: ClassHistogram,
}

impl HazardSummary {
    pub fn new(rain_hazard: &Grid, hazard: &Grid) -> Self {
        Self {
            width: hazard.width(),
            height: hazard.height(),
            rain_hazard: ClassHistogram::from_grid(rain_hazard),
            hazard: ClassHistogram::from_grid(hazard),
        }
    }

    pub fn cells(&self) -> usize {
        self.width * self.height
    }
}
