//! ESRI ASCII grid (`.asc`) reading and writing.
//!
//! Header keys are case-insensitive:
//!
//! ```text
//! ncols         3
//! nrows         2
//! xllcorner     10.0      (or xllcenter)
//! yllcorner     46.0      (or yllcenter)
//! cellsize      0.5       (or dx / dy)
//! NODATA_value  -9999     (optional)
//! 1 3 5
//! 2 -9999 4
//! ```
//!
//! Rows are stored north to south. The CRS comes from a `.prj` sidecar next
//! to the grid when present.

use hazard_common::{Crs, GeoTransform, Grid, GridError, DEFAULT_NODATA};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors reading or writing ASCII grids.
#[derive(Error, Debug)]
pub enum AsciiGridError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("missing header key: {0}")]
    MissingHeader(&'static str),

    #[error("invalid header value for {key}: {value}")]
    InvalidHeader { key: String, value: String },

    #[error("invalid cell value '{token}' on line {line}")]
    InvalidValue { line: usize, token: String },

    #[error("expected {expected} cell values, found {actual}")]
    CellCount { expected: usize, actual: usize },

    #[error("cannot write a south-up grid as ESRI ASCII")]
    SouthUp,

    #[error(transparent)]
    Grid(#[from] GridError),
}

pub type Result<T> = std::result::Result<T, AsciiGridError>;

/// Parse ASCII grid text into a [`Grid`] in the given CRS.
pub fn parse_ascii_grid(text: &str, crs: Crs) -> Result<Grid> {
    let mut header: HashMap<String, String> = HashMap::new();
    let mut lines = text.lines().enumerate().peekable();

    while let Some(&(_, line)) = lines.peek() {
        let mut tokens = line.split_whitespace();
        let Some(key) = tokens.next() else {
            lines.next();
            continue;
        };
        if key.parse::<f64>().is_ok() || !key.starts_with(|c: char| c.is_ascii_alphabetic()) {
            break;
        }
        let value = tokens.next().unwrap_or_default().to_string();
        header.insert(key.to_lowercase(), value);
        lines.next();
    }

    let width: usize = header_value(&header, "ncols")?;
    let height: usize = header_value(&header, "nrows")?;

    let (dx, dy) = match header.get("cellsize") {
        Some(_) => {
            let size: f64 = header_value(&header, "cellsize")?;
            (size, size)
        }
        None => (header_value(&header, "dx")?, header_value(&header, "dy")?),
    };

    let left = if header.contains_key("xllcorner") {
        header_value::<f64>(&header, "xllcorner")?
    } else if header.contains_key("xllcenter") {
        header_value::<f64>(&header, "xllcenter")? - dx / 2.0
    } else {
        return Err(AsciiGridError::MissingHeader("xllcorner"));
    };

    let bottom = if header.contains_key("yllcorner") {
        header_value::<f64>(&header, "yllcorner")?
    } else if header.contains_key("yllcenter") {
        header_value::<f64>(&header, "yllcenter")? - dy / 2.0
    } else {
        return Err(AsciiGridError::MissingHeader("yllcorner"));
    };

    let nodata = match header.get("nodata_value") {
        Some(_) => header_value::<f32>(&header, "nodata_value")?,
        None => DEFAULT_NODATA,
    };

    let expected = width
        .checked_mul(height)
        .ok_or_else(|| AsciiGridError::InvalidHeader {
            key: "nrows".to_string(),
            value: format!("{} (with ncols {}, cell count overflows)", height, width),
        })?;

    // Sized by the cells actually present, not by the header.
    let mut data = Vec::new();
    for (index, line) in lines {
        for token in line.split_whitespace() {
            let value = token.parse::<f32>().map_err(|_| AsciiGridError::InvalidValue {
                line: index + 1,
                token: token.to_string(),
            })?;
            data.push(value);
        }
    }

    if data.len() != expected {
        return Err(AsciiGridError::CellCount {
            expected,
            actual: data.len(),
        });
    }

    let top = bottom + height as f64 * dy;
    let transform = GeoTransform::new(left, top, dx, -dy)?;
    Ok(Grid::new(data, width, height, transform, crs, nodata)?)
}

fn header_value<T: std::str::FromStr>(
    header: &HashMap<String, String>,
    key: &'static str,
) -> Result<T> {
    let raw = header.get(key).ok_or(AsciiGridError::MissingHeader(key))?;
    raw.parse().map_err(|_| AsciiGridError::InvalidHeader {
        key: key.to_string(),
        value: raw.clone(),
    })
}

/// Read an ASCII grid file.
///
/// The CRS is taken from `<stem>.prj` when it exists and `default_crs`
/// otherwise.
pub fn read_ascii_grid(path: &Path, default_crs: &Crs) -> Result<Grid> {
    let text = fs::read_to_string(path)?;
    let prj = prj_path(path);
    let crs = if prj.is_file() {
        parse_prj(&fs::read_to_string(&prj)?)
    } else {
        None
    };
    parse_ascii_grid(&text, crs.unwrap_or_else(|| default_crs.clone()))
}

/// Extract a CRS from `.prj` sidecar text.
///
/// Understands bare identifiers (`EPSG:4326`) and WKT whose outermost
/// `AUTHORITY["EPSG","..."]` names a code. Other text becomes a custom CRS.
pub fn parse_prj(text: &str) -> Option<Crs> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(crs @ Crs::Epsg(_)) = Crs::parse(trimmed) {
        return Some(crs);
    }

    // The root object's authority closes the WKT, so it is the last one.
    const AUTHORITY: &str = "AUTHORITY[\"EPSG\",\"";
    if let Some(pos) = trimmed.rfind(AUTHORITY) {
        let rest = &trimmed[pos + AUTHORITY.len()..];
        if let Some(code) = rest.split('"').next().and_then(|c| c.parse().ok()) {
            return Some(Crs::Epsg(code));
        }
    }

    Some(Crs::Custom(trimmed.to_string()))
}

/// Render a grid as ASCII grid text.
///
/// Nodata cells are written as the grid's sentinel, or -9999 when the grid
/// uses NaN.
pub fn format_ascii_grid(grid: &Grid) -> Result<String> {
    let t = grid.transform();
    if t.cell_height > 0.0 {
        return Err(AsciiGridError::SouthUp);
    }

    let (dx, dy) = t.cell_size();
    let bottom = t.origin_y + grid.height() as f64 * t.cell_height;
    let sentinel = if grid.nodata().is_nan() {
        DEFAULT_NODATA
    } else {
        grid.nodata()
    };

    let mut out = String::new();
    let _ = writeln!(out, "ncols {}", grid.width());
    let _ = writeln!(out, "nrows {}", grid.height());
    let _ = writeln!(out, "xllcorner {}", t.origin_x);
    let _ = writeln!(out, "yllcorner {}", bottom);
    if hazard_common::transform::approx_eq(dx, dy) {
        let _ = writeln!(out, "cellsize {}", dx);
    } else {
        let _ = writeln!(out, "dx {}", dx);
        let _ = writeln!(out, "dy {}", dy);
    }
    let _ = writeln!(out, "NODATA_value {}", sentinel);

    for row in 0..grid.height() {
        let line: Vec<String> = (0..grid.width())
            .map(|col| grid.value(col, row).unwrap_or(sentinel).to_string())
            .collect();
        out.push_str(&line.join(" "));
        out.push('\n');
    }

    Ok(out)
}

/// Write a grid and its `.prj` sidecar, creating parent directories.
pub fn write_ascii_grid(path: &Path, grid: &Grid) -> Result<()> {
    let text = format_ascii_grid(grid)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, text)?;
    fs::write(prj_path(path), format!("{}\n", grid.crs()))?;
    Ok(())
}

/// Sidecar projection path of a grid file.
pub fn prj_path(path: &Path) -> PathBuf {
    path.with_extension("prj")
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::fixtures::{RAINFALL_3X2_ASC, SUSCEPTIBILITY_3X2_ASC};
    use test_utils::{assert_approx_eq, TestWorkspace};

    #[test]
    fn test_parse_susceptibility_fixture() {
        let grid = parse_ascii_grid(SUSCEPTIBILITY_3X2_ASC, Crs::wgs84()).unwrap();
        assert_eq!(grid.shape(), (3, 2));
        assert_eq!(grid.nodata(), -9999.0);
        assert_eq!(grid.value(0, 0), Some(1.0));
        assert_eq!(grid.value(2, 0), Some(5.0));
        assert_eq!(grid.value(1, 1), None);

        let t = grid.transform();
        assert_eq!(t.origin_x, 10.0);
        assert_eq!(t.origin_y, 47.0);
        assert_eq!(t.cell_width, 0.5);
        assert_eq!(t.cell_height, -0.5);
    }

    #[test]
    fn test_parse_center_origin_and_case() {
        let text = "NCOLS 2\nNROWS 1\nXLLCENTER 0.5\nYLLCENTER 0.5\nCELLSIZE 1\n7 8\n";
        let grid = parse_ascii_grid(text, Crs::wgs84()).unwrap();
        assert_eq!(grid.transform().origin_x, 0.0);
        assert_eq!(grid.transform().origin_y, 1.0);
        assert_eq!(grid.nodata(), DEFAULT_NODATA);
        assert_eq!(grid.data(), &[7.0, 8.0]);
    }

    #[test]
    fn test_parse_center_origin_fractional_cells() {
        let text = "ncols 3\nnrows 2\nxllcenter 10.05\nyllcenter 45.95\ncellsize 0.1\n1 2 3\n4 5 6\n";
        let grid = parse_ascii_grid(text, Crs::wgs84()).unwrap();
        let t = grid.transform();
        assert_approx_eq!(t.origin_x, 10.0, 1e-9);
        assert_approx_eq!(t.origin_y, 46.1, 1e-9);
        assert_approx_eq!(t.cell_height, -0.1, 1e-12);

        let extent = grid.extent();
        assert_approx_eq!(extent.max_x, 10.3, 1e-9);
        assert_approx_eq!(extent.min_y, 45.9, 1e-9);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        let short = "ncols 2\nnrows 2\nxllcorner 0\nyllcorner 0\ncellsize 1\n1 2 3\n";
        assert!(matches!(
            parse_ascii_grid(short, Crs::wgs84()),
            Err(AsciiGridError::CellCount {
                expected: 4,
                actual: 3
            })
        ));

        let missing = "ncols 2\nnrows 1\nyllcorner 0\ncellsize 1\n1 2\n";
        assert!(matches!(
            parse_ascii_grid(missing, Crs::wgs84()),
            Err(AsciiGridError::MissingHeader("xllcorner"))
        ));

        let garbage = "ncols 2\nnrows 1\nxllcorner 0\nyllcorner 0\ncellsize 1\n1 x\n";
        assert!(matches!(
            parse_ascii_grid(garbage, Crs::wgs84()),
            Err(AsciiGridError::InvalidValue { line: 6, .. })
        ));
    }

    #[test]
    fn test_oversized_header_is_an_error() {
        let overflow =
            "ncols 4294967296\nnrows 4294967296\nxllcorner 0\nyllcorner 0\ncellsize 1\n1 2\n";
        assert!(matches!(
            parse_ascii_grid(overflow, Crs::wgs84()),
            Err(AsciiGridError::InvalidHeader { ref key, .. }) if key == "nrows"
        ));

        let huge = "ncols 100000\nnrows 100000\nxllcorner 0\nyllcorner 0\ncellsize 1\n1 2\n";
        assert!(matches!(
            parse_ascii_grid(huge, Crs::wgs84()),
            Err(AsciiGridError::CellCount {
                expected: 10_000_000_000,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_format_matches_layout() {
        let grid = parse_ascii_grid(RAINFALL_3X2_ASC, Crs::wgs84()).unwrap();
        let text = format_ascii_grid(&grid).unwrap();
        assert!(text.starts_with("ncols 3\nnrows 2\nxllcorner 10\nyllcorner 46\ncellsize 0.5\n"));
        assert!(text.ends_with("80 80 -9999\n20 80 140\n"));
    }

    #[test]
    fn test_nan_nodata_written_as_sentinel() {
        let text = "ncols 2\nnrows 1\nxllcorner 0\nyllcorner 0\ncellsize 1\nNODATA_value nan\n1 nan\n";
        let grid = parse_ascii_grid(text, Crs::wgs84()).unwrap();
        assert_eq!(grid.nodata_count(), 1);
        let out = format_ascii_grid(&grid).unwrap();
        assert!(out.contains("NODATA_value -9999\n1 -9999\n"));
    }

    #[test]
    fn test_prj_sidecar() {
        assert_eq!(parse_prj("EPSG:32633\n"), Some(Crs::Epsg(32633)));
        let wkt = r#"GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],AUTHORITY["EPSG","4326"]]"#;
        assert_eq!(parse_prj(wkt), Some(Crs::Epsg(4326)));
        assert_eq!(
            parse_prj("LOCAL_CS[\"grid\"]"),
            Some(Crs::Custom("LOCAL_CS[\"grid\"]".to_string()))
        );
        assert_eq!(parse_prj("  "), None);
    }

    #[test]
    fn test_write_then_read_keeps_crs() {
        let ws = TestWorkspace::new();
        let grid = parse_ascii_grid(SUSCEPTIBILITY_3X2_ASC, Crs::Epsg(3035)).unwrap();
        let path = ws.results_dir().join("nested/out.asc");

        write_ascii_grid(&path, &grid).unwrap();
        assert!(prj_path(&path).is_file());

        let back = read_ascii_grid(&path, &Crs::wgs84()).unwrap();
        assert_eq!(back.crs(), &Crs::Epsg(3035));
        assert!(back.bit_eq(&grid));
    }

    #[test]
    fn test_missing_prj_uses_default() {
        let ws = TestWorkspace::new();
        let path = ws.write_data("tile_sus.asc", SUSCEPTIBILITY_3X2_ASC);
        let grid = read_ascii_grid(&path, &Crs::Epsg(3857)).unwrap();
        assert_eq!(grid.crs(), &Crs::Epsg(3857));
    }
}
