//! Domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by the catalog and
//! taxonomy crates (no infrastructure concerns).

pub mod aggregate;
pub mod id;
pub mod value_object;

pub use aggregate::{AggregateRoot, ExpectedVersion};
pub use id::{CategoryId, SubCategoryId, TaxonomyId};
pub use value_object::{CategoryName, SubCategoryName, ValueObject};
