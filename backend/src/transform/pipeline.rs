//! Load pipeline: existence check, then loader → cleaner → reshaper.
//!
//! # Example
//!
//! ```rust,no_run
//! use congestion::load_dataset;
//!
//! let dataset = load_dataset("서울교통공사_지하철혼잡도정보_20250930.csv")?;
//! println!("{} observations", dataset.len());
//! # Ok::<(), congestion::PipelineError>(())
//! ```

use std::path::Path;

use tracing::info;

use crate::error::{PipelineError, PipelineResult};
use crate::models::Dataset;
use crate::parser::{load_raw, parse_bytes};

use super::clean::clean;
use super::reshape::reshape;

/// Load, clean and reshape the CSV at `path`.
///
/// A missing file is reported as [`PipelineError::FileNotFound`] before any
/// read is attempted.
pub fn load_dataset<P: AsRef<Path>>(path: P) -> PipelineResult<Dataset> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(PipelineError::FileNotFound(path.to_path_buf()));
    }

    info!(path = %path.display(), "loading congestion data");
    let raw = load_raw(path)?;
    let reshaped = reshape(&clean(raw))?;
    Ok(reshaped.into_dataset(Some(path.to_path_buf())))
}

/// Same as [`load_dataset`] for bytes already in memory.
pub fn load_dataset_from_bytes(bytes: &[u8]) -> PipelineResult<Dataset> {
    let raw = parse_bytes(bytes)?;
    let reshaped = reshape(&clean(raw))?;
    Ok(reshaped.into_dataset(None))
}
