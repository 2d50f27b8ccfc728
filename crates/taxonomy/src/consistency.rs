//! Product-taxonomy consistency.
//!
//! Products reference the taxonomy either by stable id or, for older rows, by
//! name. A product whose reference no longer resolves is an orphan; orphans
//! are reported, never rewritten.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use atelier_products::{Product, ProductId};

use crate::taxonomy::Taxonomy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanReason {
    MissingCategory,
    #[serde(rename = "missing_subcategory")]
    MissingSubCategory,
}

/// A product that would point nowhere after an edit.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrphanedProductRef {
    pub product_id: ProductId,
    pub reference: String,
    pub name: String,
    pub main_category: String,
    pub sub_category: String,
    pub reason: OrphanReason,
}

impl OrphanedProductRef {
    fn new(product: &Product, reason: OrphanReason) -> Self {
        Self {
            product_id: product.id.clone(),
            reference: product.reference.clone(),
            name: product.name.clone(),
            main_category: product.main_category.clone(),
            sub_category: product.sub_category.clone(),
            reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("edit would orphan {} product(s)", .orphans.len())]
pub struct ConsistencyError {
    pub orphans: Vec<OrphanedProductRef>,
}

/// Check that a product's category and subcategory exist in `taxonomy`.
pub fn resolve(taxonomy: &Taxonomy, product: &Product) -> Result<(), OrphanReason> {
    let category = match product.category_id {
        Some(id) => taxonomy.category_by_id(id),
        None => taxonomy.category(&product.main_category),
    }
    .ok_or(OrphanReason::MissingCategory)?;

    let found = match product.sub_category_id {
        Some(id) => category.subcategory_by_id(id).is_some(),
        None => category.subcategory(&product.sub_category).is_some(),
    };
    if found {
        Ok(())
    } else {
        Err(OrphanReason::MissingSubCategory)
    }
}

/// Products from `products` that would not resolve in `proposed`.
pub fn impact<'a, I>(products: I, proposed: &Taxonomy) -> BTreeSet<OrphanedProductRef>
where
    I: IntoIterator<Item = &'a Product>,
{
    products
        .into_iter()
        .filter_map(|p| {
            resolve(proposed, p)
                .err()
                .map(|reason| OrphanedProductRef::new(p, reason))
        })
        .collect()
}
