//! Common test fixtures for hazard runs.
//!
//! Small ESRI ASCII grids describing one tile, and a temporary run directory
//! laid out like a real hazard run (`data/` for inputs, `results/` for
//! outputs).

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// 3x2 susceptibility tile with one nodata cell, on a 0.5 degree lattice.
pub const SUSCEPTIBILITY_3X2_ASC: &str = "\
ncols 3
nrows 2
xllcorner 10.0
yllcorner 46.0
cellsize 0.5
NODATA_value -9999
1 3 5
2 -9999 4
";

/// Rainfall for [`SUSCEPTIBILITY_3X2_ASC`] with one nodata cell.
pub const RAINFALL_3X2_ASC: &str = "\
ncols 3
nrows 2
xllcorner 10.0
yllcorner 46.0
cellsize 0.5
NODATA_value -9999
80 80 -9999
20 80 140
";

/// Same lattice as [`SUSCEPTIBILITY_3X2_ASC`] moved east by one cell.
pub const RAINFALL_3X2_SHIFTED_ASC: &str = "\
ncols 3
nrows 2
xllcorner 10.5
yllcorner 46.0
cellsize 0.5
NODATA_value -9999
80 80 80
80 80 80
";

/// WKT-free projection sidecar for WGS84.
pub const WGS84_PRJ: &str = "EPSG:4326\n";

/// A temporary directory laid out for a hazard run.
///
/// The directory is deleted when the workspace is dropped.
pub struct TestWorkspace {
    dir: TempDir,
}

impl TestWorkspace {
    /// Create an empty workspace with `data/` and `results/` directories.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        fs::create_dir_all(dir.path().join("data")).expect("create data dir");
        fs::create_dir_all(dir.path().join("results")).expect("create results dir");
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn data_dir(&self) -> PathBuf {
        self.dir.path().join("data")
    }

    pub fn results_dir(&self) -> PathBuf {
        self.dir.path().join("results")
    }

    /// Write `content` to `data/<name>` and return its path.
    pub fn write_data(&self, name: &str, content: &str) -> PathBuf {
        let path = self.data_dir().join(name);
        fs::write(&path, content).expect("write fixture");
        path
    }

    /// Write `content` to `<root>/<name>` and return its path.
    pub fn write_root(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, content).expect("write fixture");
        path
    }

    /// Read a file relative to `results/`.
    pub fn read_result(&self, relative: &str) -> String {
        fs::read_to_string(self.results_dir().join(relative)).expect("read result")
    }
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}
