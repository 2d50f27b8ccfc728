//! Whole-document taxonomy persistence.
//!
//! A store holds exactly one taxonomy. `save` overwrites it and assigns the
//! next version, after checking the caller's version expectation, in the same
//! way an append-only event store checks the expected stream revision.

pub mod file;
pub mod in_memory;

use std::sync::Arc;

use thiserror::Error;

use atelier_core::ExpectedVersion;
use atelier_taxonomy::Taxonomy;

pub use file::FileTaxonomyStore;
pub use in_memory::InMemoryTaxonomyStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The stored version does not match the caller's expectation.
    #[error("optimistic concurrency conflict (expected {expected:?}, found {actual})")]
    Concurrency { expected: ExpectedVersion, actual: u64 },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored data could not be turned back into a valid taxonomy.
    #[error("corrupt taxonomy store: {0}")]
    Corrupt(String),

    #[error("store lock poisoned")]
    Poisoned,
}

pub trait TaxonomyStore: Send + Sync {
    /// Current committed taxonomy.
    fn load(&self) -> Result<Taxonomy, StoreError>;

    /// Overwrite the stored taxonomy and return it with its new version.
    fn save(&self, taxonomy: &Taxonomy, expected: ExpectedVersion) -> Result<Taxonomy, StoreError>;
}

impl<S> TaxonomyStore for Arc<S>
where
    S: TaxonomyStore + ?Sized,
{
    fn load(&self) -> Result<Taxonomy, StoreError> {
        (**self).load()
    }

    fn save(&self, taxonomy: &Taxonomy, expected: ExpectedVersion) -> Result<Taxonomy, StoreError> {
        (**self).save(taxonomy, expected)
    }
}
