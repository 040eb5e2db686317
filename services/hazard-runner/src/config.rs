//! Run configuration for the hazard runner.
//!
//! Loaded from a YAML file with `${VAR}` and `${VAR:-default}` environment
//! substitution, then optionally overridden by `HAZARD_*` environment
//! variables and command-line flags.
//!
//! ```yaml
//! rainfall:
//!   mode: constant          # or "map"
//!   value_mm: 120.0         # constant mode
//!   map: rain24h.asc        # map mode, relative to data_dir
//!   std_dev_mm: 35.0
//! paths:
//!   data_dir: ../Data
//!   results_dir: ../Results
//! processing:
//!   parallel: true
//!   max_threads: 10
//! ```

use anyhow::{Context, Result};
use hazard_common::Crs;
use hazard_engine::{EngineConfig, RainfallMode, RainfallVariability};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level runner configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Rainfall source and variability
    pub rainfall: RainfallConfig,

    /// Input and output directories
    #[serde(default)]
    pub paths: PathsConfig,

    /// Tile scheduling
    #[serde(default)]
    pub processing: ProcessingConfig,

    /// CRS assumed for grids without a `.prj` sidecar
    #[serde(default)]
    pub default_crs: Crs,

    /// Classification thresholds and hazard table
    #[serde(default)]
    pub engine: EngineConfig,

    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RainfallConfig {
    pub mode: RainfallMode,
    /// Uniform 24 h accumulation (mm), constant mode
    #[serde(default)]
    pub value_mm: Option<f64>,
    /// Rainfall accumulation grid file name, map mode
    #[serde(default)]
    pub map: Option<String>,
    /// Standard deviation of the maximum daily rainfall (mm)
    #[serde(default)]
    pub std_dev_mm: Option<f64>,
    /// Optional mean maximum daily rainfall grid file name
    #[serde(default)]
    pub mean_map: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_dir: PathBuf,
    pub results_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            results_dir: PathBuf::from("results"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Process several tiles at once
    pub parallel: bool,
    /// Upper bound on concurrently processed tiles
    pub max_threads: usize,
    /// File name suffix identifying susceptibility tiles
    pub tile_suffix: String,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            parallel: false,
            max_threads: 10,
            tile_suffix: "_sus.asc".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl RunConfig {
    /// Minimal constant-mode configuration.
    pub fn constant(value_mm: f64, std_dev_mm: f64) -> Self {
        Self::with_rainfall(RainfallConfig {
            mode: RainfallMode::Constant,
            value_mm: Some(value_mm),
            map: None,
            std_dev_mm: Some(std_dev_mm),
            mean_map: None,
        })
    }

    /// Minimal map-mode configuration.
    pub fn map(map: impl Into<String>, std_dev_mm: f64) -> Self {
        Self::with_rainfall(RainfallConfig {
            mode: RainfallMode::Map,
            value_mm: None,
            map: Some(map.into()),
            std_dev_mm: Some(std_dev_mm),
            mean_map: None,
        })
    }

    fn with_rainfall(rainfall: RainfallConfig) -> Self {
        Self {
            rainfall,
            paths: PathsConfig::default(),
            processing: ProcessingConfig::default(),
            default_crs: Crs::default(),
            engine: EngineConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Apply `HAZARD_*` environment overrides.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup (environment in production).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("HAZARD_MODE") {
            self.rainfall.mode = RainfallMode::parse(&val)
                .with_context(|| format!("HAZARD_MODE must be 'constant' or 'map', got '{}'", val))?;
        }

        if let Some(val) = lookup("HAZARD_RAIN_MM") {
            let value = val
                .parse()
                .with_context(|| format!("HAZARD_RAIN_MM is not a number: '{}'", val))?;
            self.rainfall.value_mm = Some(value);
        }

        if let Some(val) = lookup("HAZARD_RAIN_MAP") {
            self.rainfall.map = Some(val);
        }

        if let Some(val) = lookup("HAZARD_STD_DEV_MM") {
            let value = val
                .parse()
                .with_context(|| format!("HAZARD_STD_DEV_MM is not a number: '{}'", val))?;
            self.rainfall.std_dev_mm = Some(value);
        }

        if let Some(val) = lookup("HAZARD_DATA_DIR") {
            self.paths.data_dir = PathBuf::from(val);
        }

        if let Some(val) = lookup("HAZARD_RESULTS_DIR") {
            self.paths.results_dir = PathBuf::from(val);
        }

        if let Some(val) = lookup("HAZARD_PARALLEL") {
            self.processing.parallel = val.to_lowercase() == "true" || val == "1";
        }

        if let Some(val) = lookup("HAZARD_MAX_THREADS") {
            self.processing.max_threads = val
                .parse()
                .with_context(|| format!("HAZARD_MAX_THREADS is not a count: '{}'", val))?;
        }

        Ok(())
    }

    /// Make relative directories relative to `base` (the config file's directory).
    pub fn resolve_paths(&mut self, base: &Path) {
        if self.paths.data_dir.is_relative() {
            self.paths.data_dir = base.join(&self.paths.data_dir);
        }
        if self.paths.results_dir.is_relative() {
            self.paths.results_dir = base.join(&self.paths.results_dir);
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        match self.rainfall.mode {
            RainfallMode::Constant => {
                anyhow::ensure!(
                    self.rainfall.value_mm.is_some(),
                    "rainfall.value_mm is required in constant mode"
                );
            }
            RainfallMode::Map => {
                anyhow::ensure!(
                    self.rainfall.map.as_deref().is_some_and(|m| !m.trim().is_empty()),
                    "rainfall.map is required in map mode"
                );
            }
        }

        let std_dev_mm = self
            .rainfall
            .std_dev_mm
            .context("rainfall.std_dev_mm is required")?;
        RainfallVariability::new(std_dev_mm).context("invalid rainfall.std_dev_mm")?;
        anyhow::ensure!(
            self.processing.max_threads > 0,
            "processing.max_threads must be > 0"
        );
        anyhow::ensure!(
            !self.processing.tile_suffix.is_empty(),
            "processing.tile_suffix cannot be empty"
        );

        self.engine
            .validate()
            .context("invalid engine configuration")?;

        Ok(())
    }

    /// Output directory of this run's mode.
    pub fn mode_results_dir(&self) -> PathBuf {
        self.paths.results_dir.join(self.rainfall.mode.as_str())
    }
}

/// Load, expand, parse and validate a YAML run configuration.
///
/// Relative directories in the file are resolved against the file's own
/// directory.
pub fn load_run_config<P: AsRef<Path>>(path: P) -> Result<RunConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read run config from {:?}", path))?;

    let mut config = parse_run_config(&content)
        .with_context(|| format!("Failed to load run config from {:?}", path))?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    config.resolve_paths(base);

    Ok(config)
}

/// Parse YAML content after environment expansion. Does not validate, so
/// that overrides can still fill in missing values.
pub fn parse_run_config(content: &str) -> Result<RunConfig> {
    let expanded = expand_env_vars(content)?;
    serde_yaml::from_str(&expanded).context("Failed to parse run config YAML")
}

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand environment variables in YAML content
/// Supports ${VAR} and ${VAR:-default} syntax
fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = String::new();
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'

            let mut var_expr = String::new();
            let mut brace_count = 1;

            while brace_count > 0 {
                match chars.next() {
                    Some('{') => {
                        brace_count += 1;
                        var_expr.push('{');
                    }
                    Some('}') => {
                        brace_count -= 1;
                        if brace_count > 0 {
                            var_expr.push('}');
                        }
                    }
                    Some(c) => var_expr.push(c),
                    None => anyhow::bail!("Unclosed variable substitution: ${{{}", var_expr),
                }
            }

            result.push_str(&resolve_var_expr(&var_expr)?);
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

/// Resolve variable expression (supports VAR and VAR:-default syntax)
fn resolve_var_expr(expr: &str) -> Result<String> {
    if let Some((var_name, default)) = expr.split_once(":-") {
        match std::env::var(var_name.trim()) {
            Ok(val) if !val.is_empty() => Ok(val),
            _ => Ok(default.to_string()),
        }
    } else {
        std::env::var(expr.trim()).with_context(|| format!("Environment variable {} not set", expr))
    }
}
