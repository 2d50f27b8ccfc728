//! Category taxonomy domain module.
//!
//! Business rules for the storefront's category tree, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage):
//!
//! - `document`: the wire-level taxonomy document (ordered name mapping)
//! - `validate`: naming rules and normalization
//! - `taxonomy`: the versioned aggregate with stable ids
//! - `diff`: what an edit removes or renames
//! - `consistency`: which products an edit would orphan

pub mod consistency;
pub mod diff;
pub mod document;
pub mod seed;
pub mod taxonomy;
pub mod validate;

pub use consistency::{ConsistencyError, OrphanReason, OrphanedProductRef, impact, resolve};
pub use diff::{CategoryChange, SubCategoryChange, TaxonomyDiff};
pub use document::{DocumentEntry, TaxonomyDocument};
pub use seed::seed_document;
pub use taxonomy::{Category, SubCategory, Taxonomy, TaxonomyError, TaxonomySnapshot};
pub use validate::{NormalizedCategory, ValidationError, canonical, normalize, validate};
