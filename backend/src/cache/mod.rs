//! Dataset cache - load each CSV once per process.
//!
//! The cache is an explicit object created by the caller (the CLI's `main`),
//! not a global. Entries are keyed by the path as given and never evicted, so
//! a file changed on disk is only seen by a new cache.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use crate::config::DEFAULT_DATA_PATH;
use crate::error::PipelineResult;
use crate::models::Dataset;
use crate::transform::pipeline::load_dataset;

/// Memoizes [`load_dataset`] per path.
pub struct DatasetCache {
    /// Path used by [`DatasetCache::get_default`].
    default_path: PathBuf,
    /// Loaded datasets (path -> dataset).
    entries: Mutex<HashMap<PathBuf, Arc<Dataset>>>,
}

impl DatasetCache {
    /// Create an empty cache whose default path is [`DEFAULT_DATA_PATH`].
    pub fn new() -> Self {
        Self::with_default_path(DEFAULT_DATA_PATH)
    }

    /// Create an empty cache with a custom default path.
    pub fn with_default_path(path: impl AsRef<Path>) -> Self {
        Self {
            default_path: path.as_ref().to_path_buf(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn default_path(&self) -> &Path {
        &self.default_path
    }

    /// Return the dataset for `path`, loading it on first use.
    ///
    /// The lock is held across the check and the load, so concurrent callers
    /// asking for the same path trigger a single load. Errors are returned
    /// without caching anything.
    pub fn get_data(&self, path: impl AsRef<Path>) -> PipelineResult<Arc<Dataset>> {
        let path = path.as_ref();
        let mut entries = self.lock();

        if let Some(dataset) = entries.get(path) {
            debug!(path = %path.display(), "dataset cache hit");
            return Ok(Arc::clone(dataset));
        }

        let dataset = Arc::new(load_dataset(path)?);
        entries.insert(path.to_path_buf(), Arc::clone(&dataset));
        debug!(path = %path.display(), rows = dataset.len(), "dataset cached");
        Ok(dataset)
    }

    /// [`DatasetCache::get_data`] for the default path.
    pub fn get_default(&self) -> PipelineResult<Arc<Dataset>> {
        self.get_data(&self.default_path)
    }

    /// Whether `path` has been loaded.
    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.lock().contains_key(path.as_ref())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // Entries are inserted fully built, so a poisoned map is still consistent.
    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, Arc<Dataset>>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for DatasetCache {
    fn default() -> Self {
        Self::new()
    }
}
