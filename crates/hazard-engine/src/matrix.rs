//! The hazard decision table.

use serde::{Deserialize, Serialize};

use crate::classifier::RainClass;
use crate::error::{HazardError, Result};

/// Final landslide hazard class as stored in the hazard grid.
pub type HazardClass = u16;

/// Susceptibility classes of the GIRI susceptibility maps.
pub const GIRI_SUSCEPTIBILITY_CLASSES: [f32; 5] = [1.0, 2.0, 3.0, 4.0, 5.0];

/// GIRI hazard table, one row per rainfall-hazard class (1..=5) and one
/// column per susceptibility class (1..=5).
pub const GIRI_HAZARD_TABLE: [[HazardClass; 5]; 5] = [
    [0, 0, 0, 0, 0],
    [0, 1, 2, 3, 5],
    [0, 2, 3, 5, 10],
    [0, 3, 5, 10, 15],
    [0, 5, 10, 15, 20],
];

/// Lookup table from (rainfall-hazard class, susceptibility class) to hazard.
///
/// Rows are rainfall classes `1..=rows`, columns are the declared
/// susceptibility class values in increasing order. The table is total and
/// non-decreasing along both axes; both properties are checked on
/// construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MatrixConfig", into = "MatrixConfig")]
pub struct HazardMatrix {
    susceptibility_classes: Vec<f32>,
    rows: Vec<Vec<HazardClass>>,
}

/// Serialized form of a [`HazardMatrix`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixConfig {
    /// Susceptibility class values, lowest to highest.
    pub susceptibility_classes: Vec<f32>,
    /// One row per rainfall-hazard class, lowest first.
    pub rows: Vec<Vec<HazardClass>>,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            susceptibility_classes: GIRI_SUSCEPTIBILITY_CLASSES.to_vec(),
            rows: GIRI_HAZARD_TABLE.iter().map(|row| row.to_vec()).collect(),
        }
    }
}

impl HazardMatrix {
    /// Build and validate a matrix.
    pub fn new(susceptibility_classes: Vec<f32>, rows: Vec<Vec<HazardClass>>) -> Result<Self> {
        if susceptibility_classes.is_empty() {
            return Err(HazardError::invalid_matrix(
                "no susceptibility classes declared",
            ));
        }
        if let Some(v) = susceptibility_classes.iter().find(|v| !v.is_finite()) {
            return Err(HazardError::invalid_matrix(format!(
                "susceptibility class {} is not finite",
                v
            )));
        }
        if let Some(pair) = susceptibility_classes.windows(2).find(|w| w[0] >= w[1]) {
            return Err(HazardError::invalid_matrix(format!(
                "susceptibility classes must be strictly increasing ({} >= {})",
                pair[0], pair[1]
            )));
        }
        if rows.is_empty() {
            return Err(HazardError::invalid_matrix("no rainfall-hazard rows"));
        }
        if rows.len() > RainClass::MAX as usize {
            return Err(HazardError::invalid_matrix(format!(
                "too many rainfall-hazard rows ({})",
                rows.len()
            )));
        }

        let columns = susceptibility_classes.len();
        for (r, row) in rows.iter().enumerate() {
            if row.len() != columns {
                return Err(HazardError::invalid_matrix(format!(
                    "row for rainfall class {} has {} entries, expected {}",
                    r + 1,
                    row.len(),
                    columns
                )));
            }
            if let Some(c) = (1..columns).find(|&c| row[c] < row[c - 1]) {
                return Err(HazardError::invalid_matrix(format!(
                    "hazard decreases with susceptibility at rainfall class {}: {} -> {}",
                    r + 1,
                    row[c - 1],
                    row[c]
                )));
            }
        }
        for r in 1..rows.len() {
            if let Some(c) = (0..columns).find(|&c| rows[r][c] < rows[r - 1][c]) {
                return Err(HazardError::invalid_matrix(format!(
                    "hazard decreases with rainfall class at susceptibility {}: {} -> {}",
                    susceptibility_classes[c],
                    rows[r - 1][c],
                    rows[r][c]
                )));
            }
        }

        Ok(Self {
            susceptibility_classes,
            rows,
        })
    }

    /// The GIRI decision table (5 rainfall classes x 5 susceptibility classes).
    pub fn giri_default() -> Self {
        Self {
            susceptibility_classes: GIRI_SUSCEPTIBILITY_CLASSES.to_vec(),
            rows: GIRI_HAZARD_TABLE.iter().map(|row| row.to_vec()).collect(),
        }
    }

    /// Table whose hazard is `max(rain_class, susceptibility_class)`, with
    /// susceptibility classes `1..=susceptibility_levels`.
    pub fn max_rule(rain_classes: u8, susceptibility_levels: u8) -> Result<Self> {
        let classes = (1..=susceptibility_levels).map(f32::from).collect();
        let rows = (1..=rain_classes)
            .map(|r| {
                (1..=susceptibility_levels)
                    .map(|s| HazardClass::from(r.max(s)))
                    .collect()
            })
            .collect();
        Self::new(classes, rows)
    }

    pub fn from_config(config: &MatrixConfig) -> Result<Self> {
        Self::new(config.susceptibility_classes.clone(), config.rows.clone())
    }

    /// Number of rainfall-hazard classes (rows).
    pub fn rain_class_count(&self) -> usize {
        self.rows.len()
    }

    pub fn susceptibility_classes(&self) -> &[f32] {
        &self.susceptibility_classes
    }

    /// Column of a susceptibility value, if it is a declared class.
    #[inline]
    pub fn column_of(&self, susceptibility: f32) -> Option<usize> {
        self.susceptibility_classes
            .iter()
            .position(|c| *c == susceptibility)
    }

    /// Hazard for a rainfall class and a susceptibility column.
    #[inline]
    pub fn lookup(&self, rain_class: RainClass, column: usize) -> Option<HazardClass> {
        let row = (rain_class as usize).checked_sub(1)?;
        self.rows.get(row)?.get(column).copied()
    }

    /// Hazard for a rainfall class and a susceptibility value.
    pub fn hazard_for(&self, rain_class: RainClass, susceptibility: f32) -> Option<HazardClass> {
        self.lookup(rain_class, self.column_of(susceptibility)?)
    }

    /// Whether any table entry equals `value`.
    pub fn produces(&self, value: f32) -> bool {
        self.rows.iter().flatten().any(|&h| h as f32 == value)
    }

    /// Highest hazard class in the table.
    pub fn max_hazard(&self) -> HazardClass {
        self.rows
            .last()
            .and_then(|row| row.last())
            .copied()
            .unwrap_or_default()
    }
}

impl Default for HazardMatrix {
    fn default() -> Self {
        Self::giri_default()
    }
}

impl TryFrom<MatrixConfig> for HazardMatrix {
    type Error = HazardError;

    fn try_from(config: MatrixConfig) -> Result<Self> {
        Self::new(config.susceptibility_classes, config.rows)
    }
}

impl From<HazardMatrix> for MatrixConfig {
    fn from(matrix: HazardMatrix) -> Self {
        Self {
            susceptibility_classes: matrix.susceptibility_classes,
            rows: matrix.rows,
        }
    }
}
