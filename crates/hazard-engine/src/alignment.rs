//! Grid alignment checks.
//!
//! Cell-by-cell combination is only meaningful when every input places its
//! cells on the same lattice. A single-cell offset would silently pair each
//! susceptibility cell with its neighbour's rainfall, so any difference in
//! shape, resolution, origin or reference frame is rejected up front.

use hazard_common::transform::approx_eq;
use hazard_common::Grid;

use crate::error::{HazardError, Result};

/// Check that `other` lies on the same lattice as `reference`.
///
/// `label` names the checked input in the error (e.g. "rainfall").
pub fn check_aligned(reference: &Grid, other: &Grid, label: &str) -> Result<()> {
    if reference.width() != other.width() {
        return Err(HazardError::grid_mismatch(
            format!("{} width", label),
            reference.width(),
            other.width(),
        ));
    }
    if reference.height() != other.height() {
        return Err(HazardError::grid_mismatch(
            format!("{} height", label),
            reference.height(),
            other.height(),
        ));
    }

    let (ref_w, ref_h) = reference.transform().cell_size();
    let (other_w, other_h) = other.transform().cell_size();
    if !approx_eq(ref_w, other_w) || !approx_eq(ref_h, other_h) {
        return Err(HazardError::grid_mismatch(
            format!("{} cell size", label),
            format!("{}x{}", ref_w, ref_h),
            format!("{}x{}", other_w, other_h),
        ));
    }

    // Same magnitude but flipped axis still pairs the wrong cells.
    let (rt, ot) = (reference.transform(), other.transform());
    if rt.cell_width.signum() != ot.cell_width.signum()
        || rt.cell_height.signum() != ot.cell_height.signum()
        || !approx_eq(rt.origin_x, ot.origin_x)
        || !approx_eq(rt.origin_y, ot.origin_y)
    {
        return Err(HazardError::grid_mismatch(
            format!("{} origin", label),
            format!("({}, {})", rt.origin_x, rt.origin_y),
            format!("({}, {})", ot.origin_x, ot.origin_y),
        ));
    }

    if reference.crs() != other.crs() {
        return Err(HazardError::grid_mismatch(
            format!("{} reference frame", label),
            reference.crs(),
            other.crs(),
        ));
    }

    Ok(())
}

/// Check every labelled input against the reference grid, stopping at the
/// first mismatch.
pub fn validate_alignment(reference: &Grid, others: &[(&str, &Grid)]) -> Result<()> {
    others
        .iter()
        .try_for_each(|(label, grid)| check_aligned(reference, grid, label))
}
