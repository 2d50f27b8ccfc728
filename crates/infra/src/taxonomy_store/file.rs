//! JSON-file-backed taxonomy store.
//!
//! The file holds a `TaxonomySnapshot` (ids, version, timestamp). Writes go to
//! a temporary file in the same directory which is synced and then renamed
//! over the target, so a reader sees either the old or the new document.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use tempfile::NamedTempFile;

use atelier_core::{AggregateRoot, ExpectedVersion};
use atelier_taxonomy::{Taxonomy, TaxonomySnapshot};

use super::{StoreError, TaxonomyStore};

#[derive(Debug)]
pub struct FileTaxonomyStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileTaxonomyStore {
    /// Open an existing store file, or create it with the storefront seed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if path.exists() {
            return Self::open_existing(path);
        }
        let seeded = Taxonomy::seeded(Utc::now()).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        Self::create(path, &seeded)
    }

    /// Open an existing store file, failing if it is missing or corrupt.
    pub fn open_existing(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let store = Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        };
        let taxonomy = store.read()?;
        tracing::info!(
            path = %store.path.display(),
            version = taxonomy.version(),
            categories = taxonomy.categories().len(),
            "opened taxonomy store"
        );
        Ok(store)
    }

    /// Create (or overwrite) a store file holding `initial`.
    pub fn create(path: impl Into<PathBuf>, initial: &Taxonomy) -> Result<Self, StoreError> {
        let store = Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        };
        store.write(initial)?;
        tracing::info!(
            path = %store.path.display(),
            version = initial.version(),
            "created taxonomy store"
        );
        Ok(store)
    }

    fn read(&self) -> Result<Taxonomy, StoreError> {
        let bytes = fs::read(&self.path)?;
        let snapshot: TaxonomySnapshot = serde_json::from_slice(&bytes)?;
        Taxonomy::from_snapshot(snapshot).map_err(|e| StoreError::Corrupt(e.to_string()))
    }

    fn write(&self, taxonomy: &Taxonomy) -> Result<(), StoreError> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        let mut tmp = NamedTempFile::new_in(parent)?;
        serde_json::to_writer_pretty(&mut tmp, &taxonomy.to_snapshot())?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }
}

impl TaxonomyStore for FileTaxonomyStore {
    fn load(&self) -> Result<Taxonomy, StoreError> {
        self.read()
    }

    fn save(&self, taxonomy: &Taxonomy, expected: ExpectedVersion) -> Result<Taxonomy, StoreError> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;

        let current = self.read()?.version();
        if !expected.matches(current) {
            return Err(StoreError::Concurrency {
                expected,
                actual: current,
            });
        }

        let committed = taxonomy.clone().committed(current + 1, Utc::now());
        self.write(&committed)?;
        Ok(committed)
    }
}
