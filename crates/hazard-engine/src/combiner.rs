//! Combination of rainfall hazard and susceptibility into landslide hazard.

use hazard_common::Grid;

use crate::alignment::check_aligned;
use crate::classifier::RainClass;
use crate::error::{HazardError, Result};
use crate::matrix::HazardMatrix;
use crate::tiling::map_cells;

/// Applies a [`HazardMatrix`] cell by cell.
#[derive(Debug, Clone, PartialEq)]
pub struct HazardCombiner {
    matrix: HazardMatrix,
}

impl HazardCombiner {
    pub fn new(matrix: HazardMatrix) -> Self {
        Self { matrix }
    }

    pub fn matrix(&self) -> &HazardMatrix {
        &self.matrix
    }

    /// Combine a rainfall-hazard grid with the susceptibility grid.
    ///
    /// Nodata in either input yields nodata. A susceptibility value that is
    /// not a declared class, or a rainfall class outside the table, aborts the
    /// combination; the lowest offending cell is reported.
    pub fn combine(
        &self,
        rain_hazard: &Grid,
        susceptibility: &Grid,
        tile_rows: usize,
    ) -> Result<Grid> {
        check_aligned(susceptibility, rain_hazard, "rainfall hazard")?;

        let width = susceptibility.width();
        let nodata = susceptibility.nodata();
        let rain_classes = self.matrix.rain_class_count();

        let data = map_cells(width, susceptibility.height(), tile_rows, |i| {
            let (Some(rain), Some(susc)) = (rain_hazard.value_at(i), susceptibility.value_at(i))
            else {
                return Ok(nodata);
            };

            let column = self.matrix.column_of(susc).ok_or_else(|| {
                HazardError::UnknownSusceptibilityClass {
                    value: susc,
                    col: i % width,
                    row: i / width,
                }
            })?;

            let rain_class = rain_class_of(rain, rain_classes)?;
            self.matrix
                .lookup(rain_class, column)
                .map(f32::from)
                .ok_or_else(|| {
                    HazardError::invalid_matrix(format!(
                        "no entry for rainfall class {} and susceptibility {}",
                        rain_class, susc
                    ))
                })
        })?;

        Ok(susceptibility.with_data(data)?)
    }
}

impl Default for HazardCombiner {
    fn default() -> Self {
        Self::new(HazardMatrix::default())
    }
}

/// Interpret a rainfall-hazard cell as a class of a table with `count` rows.
fn rain_class_of(value: f32, count: usize) -> Result<RainClass> {
    if value.fract() != 0.0 || value < 1.0 || value > count as f32 {
        return Err(HazardError::invalid_parameter(format!(
            "rainfall hazard value {} is not a class in 1..={}",
            value, count
        )));
    }
    Ok(value as RainClass)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hazard_common::{Crs, GeoTransform, DEFAULT_NODATA};

    fn grid(data: Vec<f32>, width: usize) -> Grid {
        let height = data.len() / width;
        let transform = GeoTransform::north_up(0.0, 0.0, 1.0).unwrap();
        Grid::new(data, width, height, transform, Crs::wgs84(), DEFAULT_NODATA).unwrap()
    }

    #[test]
    fn test_combine_giri_table() {
        let combiner = HazardCombiner::default();
        let rain = grid(vec![1.0, 2.0, 3.0, 5.0], 2);
        let susc = grid(vec![5.0, 2.0, 4.0, 5.0], 2);

        let out = combiner.combine(&rain, &susc, 1).unwrap();
        assert_eq!(out.data(), &[0.0, 1.0, 5.0, 20.0]);
    }

    #[test]
    fn test_nodata_in_either_input() {
        let combiner = HazardCombiner::default();
        let rain = grid(vec![DEFAULT_NODATA, 2.0, 3.0], 3);
        let susc = grid(vec![5.0, f32::NAN, 4.0], 3);

        let out = combiner.combine(&rain, &susc, 8).unwrap();
        assert_eq!(out.data(), &[DEFAULT_NODATA, DEFAULT_NODATA, 5.0]);
    }

    #[test]
    fn test_unknown_susceptibility_class() {
        let combiner = HazardCombiner::default();
        let rain = grid(vec![2.0, 2.0, 2.0, 2.0], 2);
        let susc = grid(vec![1.0, 2.0, 7.0, 2.5], 2);

        let err = combiner.combine(&rain, &susc, 1).unwrap_err();
        assert_eq!(
            err,
            HazardError::UnknownSusceptibilityClass {
                value: 7.0,
                col: 0,
                row: 1
            }
        );
    }

    #[test]
    fn test_rain_class_out_of_table() {
        let combiner = HazardCombiner::default();
        let rain = grid(vec![6.0], 1);
        let susc = grid(vec![1.0], 1);
        assert!(matches!(
            combiner.combine(&rain, &susc, 1),
            Err(HazardError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_rain_class_of() {
        assert_eq!(rain_class_of(3.0, 5).unwrap(), 3);
        assert!(rain_class_of(0.0, 5).is_err());
        assert!(rain_class_of(2.5, 5).is_err());
        assert!(rain_class_of(5.0, 4).is_err());
    }
}
