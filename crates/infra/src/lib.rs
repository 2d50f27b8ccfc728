//! Infrastructure layer: taxonomy persistence, product catalog access, and
//! the edit pipeline that ties them together.

pub mod catalog;
pub mod editor;
pub mod taxonomy_store;

pub use catalog::{CatalogError, InMemoryProductCatalog, ProductCatalog};
pub use editor::{EditError, EditOptions, EditOutcome, TaxonomyEditor};
pub use taxonomy_store::{FileTaxonomyStore, InMemoryTaxonomyStore, StoreError, TaxonomyStore};
