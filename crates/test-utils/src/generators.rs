//! Synthetic grid generators.
//!
//! These generators create predictable, verifiable susceptibility and rainfall
//! grids on a small WGS84 lattice so tests can reason about every cell.

use hazard_common::{Crs, GeoTransform, Grid, DEFAULT_NODATA};

/// Left edge of generated grids (degrees).
pub const TEST_LEFT: f64 = 10.0;
/// Top edge of generated grids (degrees).
pub const TEST_TOP: f64 = 47.0;
/// Cell size of generated grids (degrees).
pub const TEST_CELL_SIZE: f64 = 0.01;

/// North-up transform shared by all generated grids.
pub fn test_transform() -> GeoTransform {
    GeoTransform::north_up(TEST_LEFT, TEST_TOP, TEST_CELL_SIZE)
        .expect("test transform is valid")
}

/// Grid from explicit values on the shared test lattice.
pub fn grid_from(data: Vec<f32>, width: usize, height: usize) -> Grid {
    Grid::new(data, width, height, test_transform(), Crs::wgs84(), DEFAULT_NODATA)
        .expect("generated grid has consistent shape")
}

/// Grid where every cell holds `value`.
pub fn uniform_grid(width: usize, height: usize, value: f32) -> Grid {
    grid_from(vec![value; width * height], width, height)
}

/// Susceptibility grid cycling through classes 1..=5.
///
/// Cell `(col, row)` holds `(col + row) % 5 + 1`, so every class occurs in any
/// grid with at least five cells along a diagonal band.
pub fn susceptibility_grid(width: usize, height: usize) -> Grid {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push(((col + row) % 5 + 1) as f32);
        }
    }
    grid_from(data, width, height)
}

/// Rainfall grid increasing linearly from `min_mm` (first cell) to `max_mm`
/// (last cell) in row-major order.
pub fn rainfall_ramp(width: usize, height: usize, min_mm: f32, max_mm: f32) -> Grid {
    let len = width * height;
    let step = if len > 1 {
        (max_mm - min_mm) / (len - 1) as f32
    } else {
        0.0
    };
    let data = (0..len).map(|i| min_mm + step * i as f32).collect();
    grid_from(data, width, height)
}

/// Copy of `grid` with the given flat indices set to its nodata sentinel.
pub fn with_nodata(grid: &Grid, indices: &[usize]) -> Grid {
    let mut data = grid.data().to_vec();
    for &i in indices {
        data[i] = grid.nodata();
    }
    grid.with_data(data).expect("same shape")
}

/// Copy of `grid` moved by whole cells (positive `dx` moves east).
pub fn shifted(grid: &Grid, dx_cells: f64, dy_cells: f64) -> Grid {
    let t = grid.transform();
    let transform = GeoTransform::new(
        t.origin_x + dx_cells * t.cell_width,
        t.origin_y + dy_cells * t.cell_height,
        t.cell_width,
        t.cell_height,
    )
    .expect("shifted transform is valid");
    Grid::new(
        grid.data().to_vec(),
        grid.width(),
        grid.height(),
        transform,
        grid.crs().clone(),
        grid.nodata(),
    )
    .expect("same shape")
}
