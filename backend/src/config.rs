//! Application configuration.
//!
//! Defaults are constants; the data path can be overridden through the
//! environment (or a `.env` file) and then by CLI flags.

use std::path::PathBuf;

/// Default CSV export, resolved relative to the working directory.
pub const DEFAULT_DATA_PATH: &str = "서울교통공사_지하철혼잡도정보_20250930.csv";

/// Environment variable overriding [`DEFAULT_DATA_PATH`].
pub const DATA_PATH_ENV: &str = "CONGESTION_DATA_PATH";

/// Default tracing directive when `RUST_LOG` is unset.
pub const DEFAULT_LOG_DIRECTIVE: &str = "congestion=info";

/// Default outlier threshold for the quality report (%).
pub const DEFAULT_OUTLIER_THRESHOLD: f64 = 150.0;

/// Rows at or above this count as high congestion (%).
pub const HIGH_CONGESTION: f64 = 150.0;

/// Rows at or above this count as extreme values (%).
pub const EXTREME_CONGESTION: f64 = 200.0;

/// Resolved runtime configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// CSV export to load.
    pub data_path: PathBuf,
}

impl Config {
    /// Build from the process environment, loading `.env` first if present.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let data_path = lookup(DATA_PATH_ENV)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH));

        Self { data_path }
    }

    /// Replace the data path when `path` is given.
    pub fn with_data_path(mut self, path: Option<PathBuf>) -> Self {
        if let Some(path) = path {
            self.data_path = path;
        }
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
        }
    }
}
