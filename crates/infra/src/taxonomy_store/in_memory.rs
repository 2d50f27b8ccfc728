use std::sync::RwLock;

use chrono::Utc;

use atelier_core::{AggregateRoot, ExpectedVersion};
use atelier_taxonomy::{Taxonomy, TaxonomyError};

use super::{StoreError, TaxonomyStore};

/// In-memory taxonomy store.
///
/// Intended for tests/dev; contents are lost on restart.
#[derive(Debug)]
pub struct InMemoryTaxonomyStore {
    inner: RwLock<Taxonomy>,
}

impl InMemoryTaxonomyStore {
    pub fn new(taxonomy: Taxonomy) -> Self {
        Self {
            inner: RwLock::new(taxonomy),
        }
    }

    /// Store holding the storefront seed taxonomy at version 1.
    pub fn seeded() -> Result<Self, TaxonomyError> {
        Ok(Self::new(Taxonomy::seeded(Utc::now())?))
    }
}

impl TaxonomyStore for InMemoryTaxonomyStore {
    fn load(&self) -> Result<Taxonomy, StoreError> {
        let guard = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(guard.clone())
    }

    fn save(&self, taxonomy: &Taxonomy, expected: ExpectedVersion) -> Result<Taxonomy, StoreError> {
        let mut guard = self.inner.write().map_err(|_| StoreError::Poisoned)?;

        let current = guard.version();
        if !expected.matches(current) {
            return Err(StoreError::Concurrency {
                expected,
                actual: current,
            });
        }

        let committed = taxonomy.clone().committed(current + 1, Utc::now());
        *guard = committed.clone();
        Ok(committed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_taxonomy::{TaxonomyDocument, seed_document};

    #[test]
    fn fresh_store_serves_seed_at_version_one() {
        let store = InMemoryTaxonomyStore::seeded().unwrap();
        let t = store.load().unwrap();
        assert_eq!(t.version(), 1);
        assert_eq!(t.document(), seed_document());
    }

    #[test]
    fn save_bumps_version_and_replaces_content() {
        let store = InMemoryTaxonomyStore::seeded().unwrap();
        let current = store.load().unwrap();
        let next = current
            .replaced_with(&TaxonomyDocument::new().with("DECO", &["Tapis"]))
            .unwrap();

        let committed = store.save(&next, ExpectedVersion::Exact(1)).unwrap();
        assert_eq!(committed.version(), 2);
        assert_eq!(store.load().unwrap(), committed);
    }

    #[test]
    fn stale_expectation_is_rejected_and_state_kept() {
        let store = InMemoryTaxonomyStore::seeded().unwrap();
        let current = store.load().unwrap();
        store.save(&current, ExpectedVersion::Any).unwrap();

        let err = store.save(&current, ExpectedVersion::Exact(1)).unwrap_err();
        assert!(matches!(err, StoreError::Concurrency { actual: 2, .. }));
        assert_eq!(store.load().unwrap().version(), 2);
    }
}
