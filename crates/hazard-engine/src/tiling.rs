//! Row-tiled parallel evaluation of per-cell functions.
//!
//! Every output cell depends only on the input cells at the same index, so
//! the output buffer is split into disjoint row tiles that rayon fills in any
//! order. Results do not depend on the tile size or the number of threads.

use rayon::prelude::*;

use crate::error::HazardError;

/// Default number of grid rows per parallel tile.
pub const DEFAULT_TILE_ROWS: usize = 256;

/// Fill a `width * height` buffer by evaluating `cell` at every flat index.
///
/// If several cells fail, the error of the lowest index is returned so that
/// the reported failure is independent of scheduling.
pub(crate) fn map_cells<F>(
    width: usize,
    height: usize,
    tile_rows: usize,
    cell: F,
) -> Result<Vec<f32>, HazardError>
where
    F: Fn(usize) -> Result<f32, HazardError> + Sync,
{
    let len = width * height;
    let tile_len = (tile_rows.max(1) * width).max(1);
    let mut output = vec![0.0f32; len];

    let first_error = output
        .par_chunks_mut(tile_len)
        .enumerate()
        .filter_map(|(tile, chunk)| {
            let offset = tile * tile_len;
            for (i, slot) in chunk.iter_mut().enumerate() {
                match cell(offset + i) {
                    Ok(value) => *slot = value,
                    Err(e) => return Some((offset + i, e)),
                }
            }
            None
        })
        .min_by_key(|(index, _)| *index);

    match first_error {
        Some((_, e)) => Err(e),
        None => Ok(output),
    }
}
