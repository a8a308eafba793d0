//! Process-lifetime cache of neighborhood boundaries.

use std::path::PathBuf;
use std::sync::{Mutex, OnceLock, PoisonError};

use tracing::debug;

use super::dataset::read_regions;
use crate::error::ResolveError;
use crate::models::RegionCollection;

/// Backing resource the boundary dataset is read from
pub trait BoundarySource: Send + Sync {
    fn read(&self) -> Result<RegionCollection, ResolveError>;

    fn describe(&self) -> String;
}

/// GeoJSON file on disk
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl BoundarySource for FileSource {
    fn read(&self) -> Result<RegionCollection, ResolveError> {
        read_regions(&self.path)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Lazily loaded, immutable region collection.
///
/// The first `load()` reads the source; concurrent first callers wait on the
/// init lock, so every caller sees the same fully parsed collection. A failed
/// read is not cached and the next `load()` tries again.
pub struct BoundaryStore {
    source: Option<Box<dyn BoundarySource>>,
    regions: OnceLock<RegionCollection>,
    init: Mutex<()>,
}

impl BoundaryStore {
    pub fn new(source: impl BoundarySource + 'static) -> Self {
        Self {
            source: Some(Box::new(source)),
            regions: OnceLock::new(),
            init: Mutex::new(()),
        }
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::new(FileSource::new(path))
    }

    /// Store that is already loaded with `regions`
    pub fn from_regions(regions: RegionCollection) -> Self {
        Self {
            source: None,
            regions: OnceLock::from(regions),
            init: Mutex::new(()),
        }
    }

    pub fn load(&self) -> Result<&RegionCollection, ResolveError> {
        if let Some(regions) = self.regions.get() {
            return Ok(regions);
        }

        let _guard = self.init.lock().unwrap_or_else(PoisonError::into_inner);

        // Another caller may have finished while we waited
        if let Some(regions) = self.regions.get() {
            return Ok(regions);
        }

        let source = self.source.as_ref().ok_or_else(|| {
            ResolveError::DataUnavailable("no boundary source configured".to_string())
        })?;

        debug!("Reading boundary source {}", source.describe());
        let regions = source.read()?;
        Ok(self.regions.get_or_init(|| regions))
    }

    pub fn is_loaded(&self) -> bool {
        self.regions.get().is_some()
    }
}
