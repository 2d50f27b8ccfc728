//! Products domain module (read-only view).
//!
//! Products are owned by the storefront catalog; this crate only models the
//! fields the taxonomy needs to decide whether a product's category links
//! still resolve (no IO, no HTTP, no storage).

pub mod product;

pub use product::{Product, ProductId};
