//! End-to-end runs over a temporary data directory.

use hazard_runner::report::REPORT_FILE;
use hazard_runner::{load_run_config, BatchRunner, RunConfig, RunReport, TileStatus};
use test_utils::fixtures::{
    RAINFALL_3X2_ASC, RAINFALL_3X2_SHIFTED_ASC, SUSCEPTIBILITY_3X2_ASC, WGS84_PRJ,
};
use test_utils::TestWorkspace;

const UNKNOWN_CLASS_ASC: &str = "\
ncols 2
nrows 1
xllcorner 10.0
yllcorner 46.5
cellsize 0.5
NODATA_value -9999
1 9
";

const OVERSIZED_HEADER_ASC: &str = "\
ncols 4294967296
nrows 4294967296
xllcorner 10.0
yllcorner 46.0
cellsize 0.5
1 2 3
";

/// Mean maximum daily rainfall on the 3x2 fixture lattice, one nodata cell.
const MEAN_RAINFALL_3X2_ASC: &str = "\
ncols 3
nrows 2
xllcorner 10.0
yllcorner 46.0
cellsize 0.5
NODATA_value -9999
40 100 -9999
40 40 40
";

fn config_for(ws: &TestWorkspace, mut config: RunConfig) -> RunConfig {
    config.paths.data_dir = ws.data_dir();
    config.paths.results_dir = ws.results_dir();
    config
}

fn grid_body(text: &str) -> String {
    text.lines()
        .filter(|l| l.starts_with(|c: char| c.is_ascii_digit() || c == '-'))
        .map(|l| format!("{}\n", l))
        .collect()
}

#[test]
fn test_constant_run_writes_both_grids() {
    let ws = TestWorkspace::new();
    ws.write_data("A1_sus.asc", SUSCEPTIBILITY_3X2_ASC);
    ws.write_data("A1_sus.prj", WGS84_PRJ);

    let runner = BatchRunner::new(config_for(&ws, RunConfig::constant(100.0, 20.0))).unwrap();
    let report = runner.run().unwrap();

    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed(), 0);

    let rain = ws.read_result("constant/RainHazard/A1_RainHazard.asc");
    assert_eq!(grid_body(&rain), "5 5 5\n5 -9999 5\n");

    let hazard = ws.read_result("constant/Hazard/A1_Hazard.asc");
    assert!(hazard.starts_with("ncols 3\nnrows 2\nxllcorner 10\nyllcorner 46\ncellsize 0.5\n"));
    assert_eq!(grid_body(&hazard), "0 10 20\n5 -9999 15\n");

    let prj = ws.read_result("constant/Hazard/A1_Hazard.prj");
    assert_eq!(prj.trim(), "EPSG:4326");
}

#[test]
fn test_map_run_propagates_nodata() {
    let ws = TestWorkspace::new();
    ws.write_data("A1_sus.asc", SUSCEPTIBILITY_3X2_ASC);
    ws.write_data("rain24h.asc", RAINFALL_3X2_ASC);

    let runner = BatchRunner::new(config_for(&ws, RunConfig::map("rain24h.asc", 40.0))).unwrap();
    let report = runner.run().unwrap();
    assert_eq!(report.failed(), 0);

    // scores 2, 2, -, 0.5, 2, 3.5
    let rain = ws.read_result("map/RainHazard/A1_RainHazard.asc");
    assert_eq!(grid_body(&rain), "4 4 -9999\n2 -9999 5\n");

    let hazard = ws.read_result("map/Hazard/A1_Hazard.asc");
    assert_eq!(grid_body(&hazard), "0 5 -9999\n1 -9999 15\n");

    let summary = report.tiles[0].summary.as_ref().unwrap();
    assert_eq!(summary.hazard.nodata, 2);
    assert_eq!(summary.hazard.max_class(), Some(15));
}

#[test]
fn test_failing_tile_does_not_stop_run() {
    let ws = TestWorkspace::new();
    ws.write_data("A1_sus.asc", SUSCEPTIBILITY_3X2_ASC);
    ws.write_data("B2_sus.asc", UNKNOWN_CLASS_ASC);
    ws.write_data("C3_sus.asc", "not a grid");
    ws.write_data("D4_sus.asc", OVERSIZED_HEADER_ASC);

    let runner = BatchRunner::new(config_for(&ws, RunConfig::constant(60.0, 30.0))).unwrap();
    let report = runner.run().unwrap();

    assert_eq!(report.tiles.len(), 4);
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed(), 3);

    let a1 = &report.tiles[0];
    assert_eq!(a1.tile, "A1");
    assert_eq!(a1.status, TileStatus::Completed);

    let b2 = &report.tiles[1];
    assert_eq!(b2.status, TileStatus::Failed);
    assert_eq!(b2.error_kind.as_deref(), Some("UnknownSusceptibilityClass"));

    let c3 = &report.tiles[2];
    assert_eq!(c3.status, TileStatus::Failed);
    assert_eq!(c3.error_kind, None);

    let d4 = &report.tiles[3];
    assert_eq!(d4.status, TileStatus::Failed);
    assert!(d4.error.as_ref().unwrap().contains("nrows"));

    assert!(ws.results_dir().join("constant/Hazard/A1_Hazard.asc").is_file());
    assert!(!ws.results_dir().join("constant/Hazard/B2_Hazard.asc").exists());
}

#[test]
fn test_misaligned_rainfall_fails_tile() {
    let ws = TestWorkspace::new();
    ws.write_data("A1_sus.asc", SUSCEPTIBILITY_3X2_ASC);
    ws.write_data("rain24h.asc", RAINFALL_3X2_SHIFTED_ASC);

    let runner = BatchRunner::new(config_for(&ws, RunConfig::map("rain24h.asc", 40.0))).unwrap();
    let report = runner.run().unwrap();

    assert_eq!(report.failed(), 1);
    assert_eq!(report.tiles[0].error_kind.as_deref(), Some("GridMismatch"));
    assert!(report.tiles[0].error.as_ref().unwrap().contains("origin"));
}

#[test]
fn test_missing_rainfall_map_aborts_run() {
    let ws = TestWorkspace::new();
    ws.write_data("A1_sus.asc", SUSCEPTIBILITY_3X2_ASC);

    let runner = BatchRunner::new(config_for(&ws, RunConfig::map("absent.asc", 40.0))).unwrap();
    let err = runner.run().unwrap_err();
    assert!(format!("{:#}", err).contains("rainfall map"));
}

#[test]
fn test_parallel_matches_sequential() {
    let ws = TestWorkspace::new();
    for name in ["A1", "A2", "B1", "B2"] {
        ws.write_data(&format!("{}_sus.asc", name), SUSCEPTIBILITY_3X2_ASC);
    }
    ws.write_data("rain24h.asc", RAINFALL_3X2_ASC);

    let mut sequential = config_for(&ws, RunConfig::map("rain24h.asc", 25.0));
    sequential.processing.parallel = false;
    sequential.paths.results_dir = ws.results_dir().join("seq");
    BatchRunner::new(sequential).unwrap().run().unwrap();

    let mut parallel = config_for(&ws, RunConfig::map("rain24h.asc", 25.0));
    parallel.processing.parallel = true;
    parallel.processing.max_threads = 3;
    parallel.paths.results_dir = ws.results_dir().join("par");
    let report = BatchRunner::new(parallel).unwrap().run().unwrap();

    let names: Vec<_> = report.tiles.iter().map(|t| t.tile.as_str()).collect();
    assert_eq!(names, vec!["A1", "A2", "B1", "B2"]);

    for name in ["A1", "A2", "B1", "B2"] {
        for (dir, suffix) in [("RainHazard", "RainHazard"), ("Hazard", "Hazard")] {
            let rel = format!("map/{}/{}_{}.asc", dir, name, suffix);
            assert_eq!(
                ws.read_result(&format!("seq/{}", rel)),
                ws.read_result(&format!("par/{}", rel))
            );
        }
    }
}

#[test]
fn test_report_written_from_yaml_config() {
    let ws = TestWorkspace::new();
    ws.write_data("A1_sus.asc", SUSCEPTIBILITY_3X2_ASC);
    let config_path = ws.write_root(
        "hazard.yaml",
        "rainfall:\n  mode: constant\n  value_mm: 75\n  std_dev_mm: 25\n\
         paths:\n  data_dir: data\n  results_dir: results\n",
    );

    let config = load_run_config(&config_path).unwrap();
    assert_eq!(config.paths.data_dir, ws.data_dir());

    BatchRunner::new(config).unwrap().run().unwrap();

    let json = ws.read_result(&format!("constant/{}", REPORT_FILE));
    let report: RunReport = serde_json::from_str(&json).unwrap();
    assert_eq!(report.rainfall_mm, Some(75.0));
    assert_eq!(report.std_dev_mm, Some(25.0));
    assert_eq!(report.tiles.len(), 1);
    assert!(report.finished_at >= report.started_at);
}

#[test]
fn test_tiles_sharing_a_prefix_are_not_written() {
    let ws = TestWorkspace::new();
    ws.write_data("A1_sus.asc", SUSCEPTIBILITY_3X2_ASC);
    ws.write_data("N46_E010_sus.asc", SUSCEPTIBILITY_3X2_ASC);
    ws.write_data("N46_E011_sus.asc", SUSCEPTIBILITY_3X2_ASC);

    let mut config = config_for(&ws, RunConfig::constant(100.0, 20.0));
    config.processing.parallel = true;
    let report = BatchRunner::new(config).unwrap().run().unwrap();

    assert_eq!(report.tiles.len(), 3);
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed(), 2);
    for tile in &report.tiles[1..] {
        assert_eq!(tile.tile, "N46");
        assert!(tile.error.as_ref().unwrap().contains("shared by several"));
        assert!(tile.hazard_path.is_none());
    }

    assert!(ws.results_dir().join("constant/Hazard/A1_Hazard.asc").is_file());
    assert!(!ws.results_dir().join("constant/Hazard/N46_Hazard.asc").exists());
}

#[test]
fn test_mean_rainfall_map_is_shared_by_tiles() {
    let ws = TestWorkspace::new();
    ws.write_data("A1_sus.asc", SUSCEPTIBILITY_3X2_ASC);
    ws.write_data("A2_sus.asc", SUSCEPTIBILITY_3X2_ASC);
    ws.write_data("mean_max_day_rain.asc", MEAN_RAINFALL_3X2_ASC);

    let mut config = config_for(&ws, RunConfig::constant(100.0, 20.0));
    config.rainfall.mean_map = Some("mean_max_day_rain.asc".to_string());
    let report = BatchRunner::new(config).unwrap().run().unwrap();
    assert_eq!(report.failed(), 0);

    // scores 3, 0, -, 3, -, 3 against the per-cell mean
    for tile in ["A1", "A2"] {
        let rain = ws.read_result(&format!("constant/RainHazard/{}_RainHazard.asc", tile));
        assert_eq!(grid_body(&rain), "5 2 -9999\n5 -9999 5\n");

        let hazard = ws.read_result(&format!("constant/Hazard/{}_Hazard.asc", tile));
        assert_eq!(grid_body(&hazard), "0 2 -9999\n5 -9999 15\n");
    }

    let summary = report.tiles[0].summary.as_ref().unwrap();
    assert_eq!(summary.rain_hazard.nodata, 2);
    assert_eq!(summary.hazard.nodata, 2);
}

#[test]
fn test_misaligned_mean_rainfall_fails_tiles() {
    let ws = TestWorkspace::new();
    ws.write_data("A1_sus.asc", SUSCEPTIBILITY_3X2_ASC);
    ws.write_data("mean.asc", RAINFALL_3X2_SHIFTED_ASC);

    let mut config = config_for(&ws, RunConfig::constant(100.0, 20.0));
    config.rainfall.mean_map = Some("mean.asc".to_string());
    let report = BatchRunner::new(config).unwrap().run().unwrap();

    assert_eq!(report.failed(), 1);
    assert_eq!(report.tiles[0].error_kind.as_deref(), Some("GridMismatch"));
    assert!(report.tiles[0].error.as_ref().unwrap().contains("mean rainfall origin"));
}
