//! Tests for the public grid model API.

use hazard_common::{BoundingBox, Crs, GeoTransform, Grid, GridError, DEFAULT_NODATA};

// ============================================================================
// Geometry
// ============================================================================

#[test]
fn test_grid_extent_follows_transform() {
    let transform = GeoTransform::north_up(-73.5, 4.75, 0.25).unwrap();
    let grid = Grid::filled(8, 4, transform, Crs::wgs84(), DEFAULT_NODATA, 1.0).unwrap();

    assert_eq!(grid.extent(), BoundingBox::new(-73.5, 3.75, -71.5, 4.75));
    assert_eq!(grid.len(), 32);
    assert!(!grid.is_empty());
}

#[test]
fn test_south_up_transform_extent() {
    let transform = GeoTransform::new(100.0, 200.0, 10.0, 10.0).unwrap();
    assert_eq!(
        transform.extent(3, 2),
        BoundingBox::new(100.0, 200.0, 130.0, 220.0)
    );
}

#[test]
fn test_invalid_cell_size_reported() {
    let err = GeoTransform::north_up(0.0, 0.0, 0.0).unwrap_err();
    assert!(matches!(err, GridError::InvalidCellSize { .. }));
}

// ============================================================================
// CRS serialization
// ============================================================================

#[test]
fn test_crs_serializes_as_string() {
    let json = serde_json::to_string(&Crs::Epsg(4326)).unwrap();
    assert_eq!(json, "\"EPSG:4326\"");

    let parsed: Crs = serde_json::from_str("\"epsg:25832\"").unwrap();
    assert_eq!(parsed, Crs::Epsg(25832));
}

#[test]
fn test_crs_rejects_malformed_epsg() {
    let parsed: Result<Crs, _> = serde_json::from_str("\"EPSG:\"");
    assert!(parsed.is_err());
}
