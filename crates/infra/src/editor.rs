//! Taxonomy edit pipeline (application-level orchestration).
//!
//! Every mutation, whether a whole-document replace or a single-category
//! edit, runs through the same steps:
//!
//! ```text
//! edit
//!   ↓
//! 1. Load the current taxonomy (under the editor's write lock)
//!   ↓
//! 2. Build the candidate state (validation; not-found for targeted edits)
//!   ↓
//! 3. Same content as current? → return it unchanged, nothing written
//!   ↓
//! 4. Check the caller's expected version (optimistic concurrency)
//!   ↓
//! 5. Find products the edit would orphan; reject unless forced
//!   ↓
//! 6. Persist with an exact version expectation
//! ```
//!
//! A rejected edit never reaches step 6, so the stored document is left as it was.

use std::sync::Mutex;

use thiserror::Error;

use atelier_core::{AggregateRoot, ExpectedVersion};
use atelier_products::Product;
use atelier_taxonomy::{
    ConsistencyError, OrphanedProductRef, Taxonomy, TaxonomyDiff, TaxonomyDocument,
    TaxonomyError, ValidationError, impact,
};

use crate::catalog::{CatalogError, ProductCatalog};
use crate::taxonomy_store::{StoreError, TaxonomyStore};

#[derive(Debug, Error)]
pub enum EditError {
    /// The candidate document breaks a naming rule.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A targeted edit named a category or subcategory that does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The caller edited a stale version.
    #[error("version conflict (expected {expected:?}, current {actual})")]
    Conflict { expected: ExpectedVersion, actual: u64 },

    /// The edit would orphan products and was not forced.
    #[error(transparent)]
    Consistency(#[from] ConsistencyError),

    /// The store could not load or persist the document.
    #[error("storage failure: {0}")]
    Storage(StoreError),

    /// Products could not be read, so the edit's impact is unknown.
    #[error("product catalog failure: {0}")]
    Catalog(#[from] CatalogError),
}

impl From<StoreError> for EditError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Concurrency { expected, actual } => EditError::Conflict { expected, actual },
            other => EditError::Storage(other),
        }
    }
}

impl From<TaxonomyError> for EditError {
    fn from(value: TaxonomyError) -> Self {
        match value {
            TaxonomyError::Validation(e) => EditError::Validation(e),
            TaxonomyError::CategoryNotFound(_) | TaxonomyError::SubCategoryNotFound { .. } => {
                EditError::NotFound(value.to_string())
            }
            TaxonomyError::Corrupt(msg) => EditError::Storage(StoreError::Corrupt(msg)),
        }
    }
}

/// Per-edit concurrency and consistency options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditOptions {
    pub expected: ExpectedVersion,
    /// Accept the edit even if it orphans products.
    pub force: bool,
}

impl Default for EditOptions {
    fn default() -> Self {
        Self {
            expected: ExpectedVersion::Any,
            force: false,
        }
    }
}

impl EditOptions {
    pub fn expecting(version: u64) -> Self {
        Self {
            expected: ExpectedVersion::Exact(version),
            ..Self::default()
        }
    }

    pub fn forced(mut self) -> Self {
        self.force = true;
        self
    }
}

#[derive(Debug, Clone)]
pub struct EditOutcome {
    /// Canonical taxonomy after the edit.
    pub taxonomy: Taxonomy,
    /// False when the edit matched the current content and nothing was written.
    pub changed: bool,
    /// Products left dangling by a forced edit.
    pub orphaned: Vec<OrphanedProductRef>,
}

/// Reusable edit engine over a taxonomy store and a product catalog.
pub struct TaxonomyEditor<S, C> {
    store: S,
    catalog: C,
    write_lock: Mutex<()>,
}

impl<S, C> TaxonomyEditor<S, C>
where
    S: TaxonomyStore,
    C: ProductCatalog,
{
    pub fn new(store: S, catalog: C) -> Self {
        Self {
            store,
            catalog,
            write_lock: Mutex::new(()),
        }
    }

    pub fn current(&self) -> Result<Taxonomy, EditError> {
        Ok(self.store.load()?)
    }

    /// Replace the whole taxonomy with `doc`.
    pub fn replace(
        &self,
        doc: &TaxonomyDocument,
        options: EditOptions,
    ) -> Result<EditOutcome, EditError> {
        self.edit("replace", options, |t| t.replaced_with(doc))
    }

    /// Replace one category's subcategories, creating the category when absent.
    pub fn put_category(
        &self,
        name: &str,
        subcategories: Vec<String>,
        options: EditOptions,
    ) -> Result<EditOutcome, EditError> {
        self.edit("put_category", options, move |t| {
            t.with_category(name, subcategories)
        })
    }

    pub fn delete_category(
        &self,
        name: &str,
        options: EditOptions,
    ) -> Result<EditOutcome, EditError> {
        self.edit("delete_category", options, |t| t.without_category(name))
    }

    pub fn rename_category(
        &self,
        from: &str,
        to: &str,
        options: EditOptions,
    ) -> Result<EditOutcome, EditError> {
        self.edit("rename_category", options, |t| {
            t.with_category_renamed(from, to)
        })
    }

    pub fn rename_subcategory(
        &self,
        category: &str,
        from: &str,
        to: &str,
        options: EditOptions,
    ) -> Result<EditOutcome, EditError> {
        self.edit("rename_subcategory", options, |t| {
            t.with_subcategory_renamed(category, from, to)
        })
    }

    /// Products a replace with `doc` would orphan, without persisting anything.
    pub fn preview(&self, doc: &TaxonomyDocument) -> Result<Vec<OrphanedProductRef>, EditError> {
        let current = self.current()?;
        let proposed = current.replaced_with(doc)?;
        let diff = TaxonomyDiff::between(&current, &proposed);
        self.orphans(&diff, &proposed)
    }

    /// Products whose links do not resolve in the current taxonomy.
    pub fn dangling(&self) -> Result<Vec<OrphanedProductRef>, EditError> {
        let current = self.current()?;
        Ok(impact(&self.catalog.list()?, &current).into_iter().collect())
    }

    fn orphans(
        &self,
        diff: &TaxonomyDiff,
        proposed: &Taxonomy,
    ) -> Result<Vec<OrphanedProductRef>, EditError> {
        let mut candidates: Vec<Product> = Vec::new();
        for change in &diff.categories {
            candidates.extend(
                self.catalog
                    .find_by_category(change.category_id, change.before.as_str())?,
            );
        }
        for change in &diff.subcategories {
            candidates.extend(self.catalog.find_by_subcategory(
                change.category_id,
                change.category_before.as_str(),
                change.subcategory_id,
                change.before.as_str(),
            )?);
        }
        Ok(impact(&candidates, proposed).into_iter().collect())
    }

    fn edit<F>(
        &self,
        operation: &'static str,
        options: EditOptions,
        build: F,
    ) -> Result<EditOutcome, EditError>
    where
        F: FnOnce(&Taxonomy) -> Result<Taxonomy, TaxonomyError>,
    {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| EditError::Storage(StoreError::Poisoned))?;

        let current = self.store.load()?;
        let proposed = build(&current).inspect_err(|e| {
            tracing::debug!(operation, error = %e, "taxonomy edit rejected");
        })?;

        if proposed.same_content(&current) {
            tracing::debug!(operation, version = current.version(), "taxonomy edit is a no-op");
            return Ok(EditOutcome {
                taxonomy: current,
                changed: false,
                orphaned: vec![],
            });
        }

        if !options.expected.matches(current.version()) {
            tracing::debug!(
                operation,
                expected = ?options.expected,
                actual = current.version(),
                "taxonomy edit on stale version"
            );
            return Err(EditError::Conflict {
                expected: options.expected,
                actual: current.version(),
            });
        }

        let diff = TaxonomyDiff::between(&current, &proposed);
        let orphaned = self.orphans(&diff, &proposed)?;
        if !orphaned.is_empty() && !options.force {
            tracing::debug!(operation, orphaned = orphaned.len(), "taxonomy edit would orphan products");
            return Err(ConsistencyError { orphans: orphaned }.into());
        }

        let committed = self
            .store
            .save(&proposed, ExpectedVersion::Exact(current.version()))?;

        tracing::info!(
            operation,
            from_version = current.version(),
            to_version = committed.version(),
            removed_categories = diff.removed_categories(),
            renamed_categories = diff.renamed_categories(),
            removed_subcategories = diff.removed_subcategories(),
            renamed_subcategories = diff.renamed_subcategories(),
            added_categories = diff.added_categories,
            added_subcategories = diff.added_subcategories,
            "taxonomy updated"
        );
        if !orphaned.is_empty() {
            tracing::warn!(
                operation,
                orphaned = orphaned.len(),
                version = committed.version(),
                "forced taxonomy edit left products orphaned"
            );
        }

        Ok(EditOutcome {
            taxonomy: committed,
            changed: true,
            orphaned,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use atelier_taxonomy::{OrphanReason, seed_document};

    use crate::catalog::InMemoryProductCatalog;
    use crate::taxonomy_store::InMemoryTaxonomyStore;

    type Editor = TaxonomyEditor<Arc<InMemoryTaxonomyStore>, Arc<InMemoryProductCatalog>>;

    fn editor_with(products: Vec<Product>) -> (Editor, Arc<InMemoryProductCatalog>) {
        let store = Arc::new(InMemoryTaxonomyStore::seeded().unwrap());
        let catalog = Arc::new(InMemoryProductCatalog::with_products(products));
        (TaxonomyEditor::new(store, catalog.clone()), catalog)
    }

    fn editor() -> Editor {
        editor_with(vec![]).0
    }

    fn without(doc: &TaxonomyDocument, category: &str) -> TaxonomyDocument {
        let mut doc = doc.clone();
        doc.remove(category);
        doc
    }

    #[test]
    fn replace_then_get_round_trips_document() {
        let editor = editor();
        let doc = TaxonomyDocument::new()
            .with("SALONS", &["Salon en U", "Salon en L", "Salon d'angle"])
            .with("DECO", &["Tapis", "Mirroirs"]);

        let outcome = editor.replace(&doc, EditOptions::default()).unwrap();
        assert!(outcome.changed);
        assert_eq!(outcome.taxonomy.version(), 2);
        assert_eq!(editor.current().unwrap().document(), doc);
    }

    #[test]
    fn replace_is_idempotent() {
        let editor = editor();
        let doc = without(&seed_document(), "JARDIN");

        let first = editor.replace(&doc, EditOptions::default()).unwrap();
        let second = editor.replace(&doc, EditOptions::default()).unwrap();

        assert!(first.changed);
        assert!(!second.changed);
        assert_eq!(second.taxonomy, first.taxonomy);
        assert_eq!(editor.current().unwrap().version(), 2);
    }

    #[test]
    fn identical_resubmission_is_accepted_even_with_stale_version() {
        let editor = editor();
        let doc = without(&seed_document(), "JARDIN");
        editor.replace(&doc, EditOptions::expecting(1)).unwrap();

        let again = editor.replace(&doc, EditOptions::expecting(1)).unwrap();
        assert!(!again.changed);
    }

    #[test]
    fn invalid_replace_leaves_document_unchanged() {
        let editor = editor();
        let before = editor.current().unwrap();
        let doc = TaxonomyDocument::new().with("SALONS", &["Salon en L", "Salon en L"]);

        let err = editor.replace(&doc, EditOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            EditError::Validation(ValidationError::DuplicateSubCategory { .. })
        ));
        assert_eq!(editor.current().unwrap(), before);
    }

    #[test]
    fn concurrent_edits_from_same_base_detect_lost_update() {
        let editor = editor();
        let base = editor.current().unwrap();
        let v = base.version();

        let mut edit_a = base.document();
        edit_a.upsert("DECO", vec!["Mirroirs".into(), "Tapis".into()]);
        let mut edit_b = base.document();
        edit_b.upsert("CHAISES", vec!["Chaises".into(), "Tabourets".into()]);

        editor.replace(&edit_a, EditOptions::expecting(v)).unwrap();
        let err = editor.replace(&edit_b, EditOptions::expecting(v)).unwrap_err();

        assert!(matches!(err, EditError::Conflict { actual, .. } if actual == v + 1));
        let current = editor.current().unwrap();
        assert_eq!(current.category("DECO").unwrap().subcategory_names(), vec!["Mirroirs", "Tapis"]);
    }

    #[test]
    fn without_version_last_writer_wins_but_version_moves() {
        let editor = editor();
        let base = editor.current().unwrap();

        let mut edit_a = base.document();
        edit_a.upsert("DECO", vec!["Mirroirs".into(), "Tapis".into()]);
        let mut edit_b = base.document();
        edit_b.upsert("CHAISES", vec!["Chaises".into(), "Tabourets".into()]);

        editor.replace(&edit_a, EditOptions::default()).unwrap();
        let outcome = editor.replace(&edit_b, EditOptions::default()).unwrap();

        assert_eq!(outcome.taxonomy.version(), base.version() + 2);
        let deco = outcome.taxonomy.category("DECO").unwrap().subcategory_names();
        assert_eq!(deco, vec!["Mirroirs"]);
    }

    #[test]
    fn deleting_referenced_category_is_blocked() {
        let (editor, _) = editor_with(vec![
            Product::new("p1", "CH-1", "Lit Roma", "CHAMBRE", "Lits"),
            Product::new("p2", "SL-1", "Oslo", "SALONS", "Salon en L"),
        ]);
        let before = editor.current().unwrap();

        let err = editor
            .delete_category("chambre", EditOptions::default())
            .unwrap_err();
        match err {
            EditError::Consistency(e) => {
                assert_eq!(e.orphans.len(), 1);
                assert_eq!(e.orphans[0].product_id.as_str(), "p1");
                assert_eq!(e.orphans[0].reason, OrphanReason::MissingCategory);
            }
            other => panic!("expected consistency error, got {other:?}"),
        }
        assert_eq!(editor.current().unwrap(), before);
    }

    #[test]
    fn forced_delete_proceeds_and_reports_dangling_products() {
        let (editor, _) = editor_with(vec![Product::new("p1", "CH-1", "Lit Roma", "CHAMBRE", "Lits")]);

        let outcome = editor
            .delete_category("CHAMBRE", EditOptions::default().forced())
            .unwrap();
        assert_eq!(outcome.orphaned.len(), 1);
        assert!(outcome.taxonomy.category("CHAMBRE").is_none());

        let dangling = editor.dangling().unwrap();
        assert_eq!(dangling.len(), 1);
        assert_eq!(dangling[0].main_category, "CHAMBRE");
    }

    #[test]
    fn delete_removes_category_and_subcategories_atomically() {
        let editor = editor();
        editor
            .delete_category("MEUBLES", EditOptions::default())
            .unwrap();
        let doc = editor.current().unwrap().document();
        assert!(!doc.contains("MEUBLES"));
        assert_eq!(doc, without(&seed_document(), "MEUBLES"));
    }

    #[test]
    fn removing_referenced_subcategory_is_blocked() {
        let (editor, _) = editor_with(vec![Product::new("p1", "SL-2", "Milano", "SALONS", "Salon en U")]);
        let err = editor
            .put_category("SALONS", vec!["Salon en L".into()], EditOptions::default())
            .unwrap_err();
        match err {
            EditError::Consistency(e) => {
                assert_eq!(e.orphans[0].reason, OrphanReason::MissingSubCategory)
            }
            other => panic!("expected consistency error, got {other:?}"),
        }
    }

    #[test]
    fn rename_keeps_id_linked_products_resolving() {
        let store = Arc::new(InMemoryTaxonomyStore::seeded().unwrap());
        let current = store.load().unwrap();
        let salons = current.category("SALONS").unwrap();
        let linked = Product::new("p1", "SL-1", "Oslo", "SALONS", "Salon en L")
            .with_links(salons.id(), salons.subcategory("Salon en L").unwrap().id());
        let catalog = Arc::new(InMemoryProductCatalog::with_products(vec![linked]));
        let editor = TaxonomyEditor::new(store, catalog);

        let outcome = editor
            .rename_category("SALONS", "SÉJOURS", EditOptions::expecting(1))
            .unwrap();
        assert!(outcome.orphaned.is_empty());
        assert!(editor.dangling().unwrap().is_empty());

        editor
            .rename_subcategory("SÉJOURS", "Salon en L", "Salon d'angle", EditOptions::default())
            .unwrap();
        assert!(editor.dangling().unwrap().is_empty());
    }

    #[test]
    fn rename_orphans_name_linked_products_unless_forced() {
        let (editor, _) = editor_with(vec![Product::new("p1", "SL-1", "Oslo", "SALONS", "Salon en L")]);
        assert!(matches!(
            editor.rename_category("SALONS", "SÉJOURS", EditOptions::default()),
            Err(EditError::Consistency(_))
        ));
        let outcome = editor
            .rename_category("SALONS", "SÉJOURS", EditOptions::default().forced())
            .unwrap();
        assert_eq!(outcome.orphaned.len(), 1);
    }

    #[test]
    fn edits_unrelated_to_products_ignore_them() {
        let (editor, _) = editor_with(vec![Product::new("p1", "SL-1", "Oslo", "SALONS", "Salon en L")]);
        let outcome = editor
            .put_category("DECO", vec!["Mirroirs".into(), "Vases".into()], EditOptions::default())
            .unwrap();
        assert!(outcome.changed);
        assert!(outcome.orphaned.is_empty());
    }

    #[test]
    fn preexisting_dangling_products_do_not_block_unrelated_edits() {
        let (editor, _) = editor_with(vec![Product::new("p9", "X-1", "Ghost", "RANGEMENT", "Commodes")]);
        assert_eq!(editor.dangling().unwrap().len(), 1);
        editor
            .delete_category("JARDIN", EditOptions::default())
            .unwrap();
    }

    #[test]
    fn preview_reports_without_persisting() {
        let (editor, _) = editor_with(vec![Product::new("p1", "CH-1", "Lit Roma", "CHAMBRE", "Lits")]);
        let doc = without(&seed_document(), "CHAMBRE");

        let orphans = editor.preview(&doc).unwrap();
        assert_eq!(orphans.len(), 1);
        assert_eq!(editor.current().unwrap().version(), 1);
    }

    #[test]
    fn targeted_edits_on_missing_names_are_not_found() {
        let editor = editor();
        assert!(matches!(
            editor.delete_category("RANGEMENT", EditOptions::default()),
            Err(EditError::NotFound(_))
        ));
        assert!(matches!(
            editor.rename_subcategory("SALONS", "Salon en Z", "X", EditOptions::default()),
            Err(EditError::NotFound(_))
        ));
    }

    struct UnreadableCatalog;

    impl ProductCatalog for UnreadableCatalog {
        fn list(&self) -> Result<Vec<Product>, CatalogError> {
            Err(CatalogError::Poisoned)
        }

        fn find_by_category(
            &self,
            _: atelier_core::CategoryId,
            _: &str,
        ) -> Result<Vec<Product>, CatalogError> {
            Err(CatalogError::Poisoned)
        }

        fn find_by_subcategory(
            &self,
            _: atelier_core::CategoryId,
            _: &str,
            _: atelier_core::SubCategoryId,
            _: &str,
        ) -> Result<Vec<Product>, CatalogError> {
            Err(CatalogError::Poisoned)
        }
    }

    #[test]
    fn unreadable_catalog_blocks_removals_instead_of_passing_them() {
        let store = Arc::new(InMemoryTaxonomyStore::seeded().unwrap());
        let editor = TaxonomyEditor::new(store, UnreadableCatalog);

        let err = editor
            .delete_category("CHAMBRE", EditOptions::default())
            .unwrap_err();
        assert!(matches!(err, EditError::Catalog(CatalogError::Poisoned)));
        assert!(editor.current().unwrap().category("CHAMBRE").is_some());
        assert!(matches!(editor.dangling(), Err(EditError::Catalog(_))));
    }

    struct ReadOnlyStore(InMemoryTaxonomyStore);

    impl TaxonomyStore for ReadOnlyStore {
        fn load(&self) -> Result<Taxonomy, StoreError> {
            self.0.load()
        }

        fn save(&self, _: &Taxonomy, _: ExpectedVersion) -> Result<Taxonomy, StoreError> {
            Err(StoreError::Io(std::io::Error::other("read-only filesystem")))
        }
    }

    #[test]
    fn failed_save_is_a_storage_error_and_keeps_state() {
        let store = ReadOnlyStore(InMemoryTaxonomyStore::seeded().unwrap());
        let editor = TaxonomyEditor::new(store, InMemoryProductCatalog::new());
        let before = editor.current().unwrap();

        let err = editor
            .delete_category("JARDIN", EditOptions::default())
            .unwrap_err();
        assert!(matches!(err, EditError::Storage(StoreError::Io(_))));
        assert_eq!(editor.current().unwrap(), before);
    }
}
