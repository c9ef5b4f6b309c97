//! Analysis configuration
//!
//! Tunables are passed explicitly into the calculator, the revision engine
//! and the session; nothing is read from process-wide state.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Config file name inside the user config directory
const CONFIG_FILE: &str = "config.yaml";

/// Ordering of test items for cumulative top-fail attribution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestOrder {
    /// Ascending test number, test id breaks ties
    #[default]
    TestNumber,
    /// Ascending test id
    TestId,
    /// Order in which test items were first loaded
    LoadOrder,
}

impl std::fmt::Display for TestOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestOrder::TestNumber => write!(f, "test_number"),
            TestOrder::TestId => write!(f, "test_id"),
            TestOrder::LoadOrder => write!(f, "load_order"),
        }
    }
}

/// Numeric and presentation settings for an analysis session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Substitute for a zero standard deviation
    pub std_epsilon: f64,

    /// Candidate limits closer than this to the original count as unchanged
    pub limit_tolerance: f64,

    /// Decimal places of fail/reject rate percentages
    pub rate_precision: u32,

    /// Decimal places of AVG/STD/MEDIAN/MIN/MAX and the capability indices
    pub stat_precision: u32,

    /// Decimal places of the sigma level
    pub sigma_precision: u32,

    /// Long-term shift added to `3 * Cpk` for the sigma level
    pub sigma_shift: f64,

    /// Test item order for top-fail accumulation
    pub test_order: TestOrder,

    /// Joins several column values inside one group key
    pub group_separator: String,

    /// Joins the group and sub-group halves of a key
    pub group_joiner: String,

    /// Group value used when no columns are selected
    pub group_wildcard: String,

    /// Histogram bin count for downstream charts
    pub histogram_bins: usize,

    /// Relative widening of a degenerate `lo == hi` display range
    pub degenerate_ratio: f64,

    /// Half-width of the display range when `lo == hi == 0`
    pub degenerate_zero_span: f64,

    /// Number of items in the capability pareto
    pub pareto_top_n: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            std_epsilon: 1e-5,
            limit_tolerance: 1e-9,
            rate_precision: 3,
            stat_precision: 6,
            sigma_precision: 2,
            sigma_shift: 1.5,
            test_order: TestOrder::default(),
            group_separator: "|".to_string(),
            group_joiner: "@".to_string(),
            group_wildcard: "*".to_string(),
            histogram_bins: 30,
            degenerate_ratio: 0.1,
            degenerate_zero_span: 0.1,
            pareto_top_n: 20,
        }
    }
}

/// Errors reading a configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

impl AnalysisConfig {
    /// Parse a YAML config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Resolve the effective config
    ///
    /// An explicit path must exist. Otherwise the per-user config file is used
    /// when present, and defaults when not.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match Self::user_config_path() {
            Some(path) if path.exists() => {
                tracing::debug!(path = %path.display(), "loading user config");
                Self::from_file(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// `<config_dir>/dct/config.yaml` for the current user
    pub fn user_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "dct").map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }
}
