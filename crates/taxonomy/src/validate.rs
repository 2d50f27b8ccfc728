//! Taxonomy naming rules.
//!
//! Rules run as whole-document passes, in this order:
//! 1. no blank category name
//! 2. no two category names that collide once trimmed and uppercased
//! 3. no blank subcategory name
//! 4. no subcategory repeated within its category (case-sensitive, trimmed)

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use atelier_core::{CategoryName, SubCategoryName};

use crate::document::TaxonomyDocument;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("empty category name at position {position}")]
    EmptyCategoryName { position: usize },

    #[error("duplicate category name {normalized:?}: {first:?} and {second:?} normalize to the same key")]
    DuplicateCategoryName {
        normalized: String,
        first: String,
        second: String,
    },

    #[error("empty subcategory name in category {category:?} at position {position}")]
    EmptySubCategoryName { category: String, position: usize },

    #[error("duplicate subcategory {name:?} in category {category:?}")]
    DuplicateSubCategory { category: String, name: String },
}


/// A category that passed validation, with typed names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedCategory {
    pub name: CategoryName,
    pub subcategories: Vec<SubCategoryName>,
}

/// Check a candidate document. Pure; no side effects.
pub fn validate(doc: &TaxonomyDocument) -> Result<(), ValidationError> {
    normalize(doc).map(|_| ())
}

/// Validate and return the canonical form (uppercase keys, trimmed subcategories).
pub fn normalize(doc: &TaxonomyDocument) -> Result<Vec<NormalizedCategory>, ValidationError> {
    let entries = doc.entries();

    let mut names = Vec::with_capacity(entries.len());
    for (position, entry) in entries.iter().enumerate() {
        let name = CategoryName::parse(&entry.category)
            .ok_or(ValidationError::EmptyCategoryName { position })?;
        names.push(name);
    }

    let mut seen: HashMap<&str, &str> = HashMap::with_capacity(names.len());
    for (name, entry) in names.iter().zip(entries) {
        if let Some(first) = seen.insert(name.as_str(), entry.category.as_str()) {
            return Err(ValidationError::DuplicateCategoryName {
                normalized: name.to_string(),
                first: first.to_string(),
                second: entry.category.clone(),
            });
        }
    }

    let mut subcategories = Vec::with_capacity(entries.len());
    for (name, entry) in names.iter().zip(entries) {
        let mut subs = Vec::with_capacity(entry.subcategories.len());
        for (position, raw) in entry.subcategories.iter().enumerate() {
            let sub = SubCategoryName::parse(raw).ok_or_else(|| {
                ValidationError::EmptySubCategoryName {
                    category: name.to_string(),
                    position,
                }
            })?;
            subs.push(sub);
        }
        subcategories.push(subs);
    }

    for (name, subs) in names.iter().zip(&subcategories) {
        let mut seen = HashSet::with_capacity(subs.len());
        for sub in subs {
            if !seen.insert(sub.as_str()) {
                return Err(ValidationError::DuplicateSubCategory {
                    category: name.to_string(),
                    name: sub.to_string(),
                });
            }
        }
    }

    Ok(names
        .into_iter()
        .zip(subcategories)
        .map(|(name, subcategories)| NormalizedCategory {
            name,
            subcategories,
        })
        .collect())
}

/// Validate and return the canonical document.
pub fn canonical(doc: &TaxonomyDocument) -> Result<TaxonomyDocument, ValidationError> {
    Ok(normalize(doc)?
        .into_iter()
        .map(|c| {
            (
                c.name.into_string(),
                c.subcategories
                    .into_iter()
                    .map(|s| s.into_string())
                    .collect::<Vec<_>>(),
            )
        })
        .collect())
}
