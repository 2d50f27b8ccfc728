//! Structural difference between two taxonomy states, keyed by stable id.

use atelier_core::{CategoryId, CategoryName, SubCategoryId, SubCategoryName};

use crate::taxonomy::Taxonomy;

/// A category that was removed (`after == None`) or renamed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryChange {
    pub category_id: CategoryId,
    pub before: CategoryName,
    pub after: Option<CategoryName>,
}

/// A subcategory of a surviving category that was removed or renamed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubCategoryChange {
    pub category_id: CategoryId,
    pub category_before: CategoryName,
    pub subcategory_id: SubCategoryId,
    pub before: SubCategoryName,
    pub after: Option<SubCategoryName>,
}

/// Everything an edit takes away or renames, plus how much it adds.
///
/// Subcategories of a removed category are not listed separately; they go
/// with their category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaxonomyDiff {
    pub categories: Vec<CategoryChange>,
    pub subcategories: Vec<SubCategoryChange>,
    pub added_categories: usize,
    pub added_subcategories: usize,
}

impl TaxonomyDiff {
    pub fn between(before: &Taxonomy, after: &Taxonomy) -> Self {
        let mut diff = TaxonomyDiff::default();

        for old in before.categories() {
            let Some(new) = after.category_by_id(old.id()) else {
                diff.categories.push(CategoryChange {
                    category_id: old.id(),
                    before: old.name().clone(),
                    after: None,
                });
                continue;
            };

            if new.name() != old.name() {
                diff.categories.push(CategoryChange {
                    category_id: old.id(),
                    before: old.name().clone(),
                    after: Some(new.name().clone()),
                });
            }

            for old_sub in old.subcategories() {
                let renamed_to = match new.subcategory_by_id(old_sub.id()) {
                    None => None,
                    Some(new_sub) if new_sub.name() != old_sub.name() => {
                        Some(new_sub.name().clone())
                    }
                    Some(_) => continue,
                };
                diff.subcategories.push(SubCategoryChange {
                    category_id: old.id(),
                    category_before: old.name().clone(),
                    subcategory_id: old_sub.id(),
                    before: old_sub.name().clone(),
                    after: renamed_to,
                });
            }

            diff.added_subcategories += new
                .subcategories()
                .iter()
                .filter(|s| old.subcategory_by_id(s.id()).is_none())
                .count();
        }

        for new in after.categories() {
            if before.category_by_id(new.id()).is_none() {
                diff.added_categories += 1;
                diff.added_subcategories += new.subcategories().len();
            }
        }

        diff
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
            && self.subcategories.is_empty()
            && self.added_categories == 0
            && self.added_subcategories == 0
    }

    pub fn removed_categories(&self) -> usize {
        self.categories.iter().filter(|c| c.after.is_none()).count()
    }

    pub fn renamed_categories(&self) -> usize {
        self.categories.iter().filter(|c| c.after.is_some()).count()
    }

    pub fn removed_subcategories(&self) -> usize {
        self.subcategories.iter().filter(|s| s.after.is_none()).count()
    }

    pub fn renamed_subcategories(&self) -> usize {
        self.subcategories.iter().filter(|s| s.after.is_some()).count()
    }
}
