use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use atelier_core::{
    AggregateRoot, CategoryId, CategoryName, SubCategoryId, SubCategoryName,
    TaxonomyId,
};

use crate::document::TaxonomyDocument;
use crate::seed::seed_document;
use crate::validate::{self, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaxonomyError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("category not found: {0:?}")]
    CategoryNotFound(String),

    #[error("subcategory {subcategory:?} not found in category {category:?}")]
    SubCategoryNotFound {
        category: String,
        subcategory: String,
    },

    #[error("corrupt taxonomy snapshot: {0}")]
    Corrupt(String),
}

/// Subcategory entity, scoped to one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubCategory {
    id: SubCategoryId,
    name: SubCategoryName,
}

impl SubCategory {
    pub fn id(&self) -> SubCategoryId {
        self.id
    }

    pub fn name(&self) -> &SubCategoryName {
        &self.name
    }
}

/// Category entity with its ordered subcategories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    id: CategoryId,
    name: CategoryName,
    subcategories: Vec<SubCategory>,
}

impl Category {
    pub fn id(&self) -> CategoryId {
        self.id
    }

    pub fn name(&self) -> &CategoryName {
        &self.name
    }

    pub fn subcategories(&self) -> &[SubCategory] {
        &self.subcategories
    }

    /// Exact (trimmed, case-sensitive) lookup.
    pub fn subcategory(&self, name: &str) -> Option<&SubCategory> {
        let name = name.trim();
        self.subcategories.iter().find(|s| s.name.as_str() == name)
    }

    pub fn subcategory_by_id(&self, id: SubCategoryId) -> Option<&SubCategory> {
        self.subcategories.iter().find(|s| s.id == id)
    }

    pub fn subcategory_names(&self) -> Vec<String> {
        self.subcategories
            .iter()
            .map(|s| s.name.to_string())
            .collect()
    }
}

/// Persisted form of the aggregate (ids included, indexes excluded).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomySnapshot {
    pub taxonomy_id: TaxonomyId,
    pub version: u64,
    pub updated_at: DateTime<Utc>,
    pub categories: Vec<Category>,
}

/// Aggregate root: the whole category tree, versioned as one unit.
///
/// Categories are kept in display order. The name index is derived from the
/// category list and rebuilt whenever the list changes.
#[derive(Debug, Clone)]
pub struct Taxonomy {
    id: TaxonomyId,
    version: u64,
    updated_at: DateTime<Utc>,
    categories: Vec<Category>,
    by_name: HashMap<CategoryName, usize>,
}

impl PartialEq for Taxonomy {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.version == other.version
            && self.updated_at == other.updated_at
            && self.categories == other.categories
    }
}

impl Eq for Taxonomy {}

impl AggregateRoot for Taxonomy {
    type Id = TaxonomyId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

impl Taxonomy {
    fn assemble(
        id: TaxonomyId,
        version: u64,
        updated_at: DateTime<Utc>,
        categories: Vec<Category>,
    ) -> Self {
        let by_name = categories
            .iter()
            .enumerate()
            .map(|(idx, c)| (c.name.clone(), idx))
            .collect();
        Self {
            id,
            version,
            updated_at,
            categories,
            by_name,
        }
    }

    /// First committed state of a new store (version 1, fresh ids).
    pub fn initial(doc: &TaxonomyDocument, now: DateTime<Utc>) -> Result<Self, TaxonomyError> {
        let empty = Self::assemble(TaxonomyId::new(), 1, now, Vec::new());
        let taxonomy = empty.replaced_with(doc)?;
        Ok(taxonomy)
    }

    /// Initial state built from the storefront seed document.
    pub fn seeded(now: DateTime<Utc>) -> Result<Self, TaxonomyError> {
        Self::initial(&seed_document(), now)
    }

    /// Rebuild from a stored snapshot, rejecting anything the validator would not accept.
    pub fn from_snapshot(snapshot: TaxonomySnapshot) -> Result<Self, TaxonomyError> {
        let mut category_ids = HashSet::new();
        let mut subcategory_ids = HashSet::new();
        for category in &snapshot.categories {
            if CategoryName::normalize(category.name.as_str()) != category.name.as_str() {
                return Err(TaxonomyError::Corrupt(format!(
                    "category name {:?} is not normalized",
                    category.name.as_str()
                )));
            }
            if !category_ids.insert(category.id) {
                return Err(TaxonomyError::Corrupt(format!(
                    "duplicate category id {}",
                    category.id
                )));
            }
            for sub in &category.subcategories {
                if sub.name.as_str().trim() != sub.name.as_str() {
                    return Err(TaxonomyError::Corrupt(format!(
                        "subcategory name {:?} is not trimmed",
                        sub.name.as_str()
                    )));
                }
                if !subcategory_ids.insert(sub.id) {
                    return Err(TaxonomyError::Corrupt(format!(
                        "duplicate subcategory id {}",
                        sub.id
                    )));
                }
            }
        }

        let taxonomy = Self::assemble(
            snapshot.taxonomy_id,
            snapshot.version,
            snapshot.updated_at,
            snapshot.categories,
        );
        validate::validate(&taxonomy.document())
            .map_err(|e| TaxonomyError::Corrupt(e.to_string()))?;
        Ok(taxonomy)
    }

    pub fn to_snapshot(&self) -> TaxonomySnapshot {
        TaxonomySnapshot {
            taxonomy_id: self.id,
            version: self.version,
            updated_at: self.updated_at,
            categories: self.categories.clone(),
        }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Lookup through the name index (normalized, case-insensitive).
    pub fn category(&self, name: &str) -> Option<&Category> {
        let key = CategoryName::parse(name)?;
        self.by_name.get(&key).map(|&idx| &self.categories[idx])
    }

    pub fn category_by_id(&self, id: CategoryId) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// Wire form: ordered name mapping without ids.
    pub fn document(&self) -> TaxonomyDocument {
        self.categories
            .iter()
            .map(|c| (c.name.to_string(), c.subcategory_names()))
            .collect()
    }

    /// Same tree (names, ids and order), ignoring version metadata.
    pub fn same_content(&self, other: &Taxonomy) -> bool {
        self.categories == other.categories
    }

    /// Return this taxonomy stamped with a new version, as the store commits it.
    pub fn committed(mut self, version: u64, at: DateTime<Utc>) -> Self {
        self.version = version;
        self.updated_at = at;
        self
    }

    /// Candidate state for a whole-document replace.
    ///
    /// Categories whose normalized name already exists keep their id, and so
    /// do subcategories whose name already exists in the same category.
    /// Everything else gets a fresh id. Version metadata is left untouched.
    pub fn replaced_with(&self, doc: &TaxonomyDocument) -> Result<Self, TaxonomyError> {
        let normalized = validate::normalize(doc)?;

        let categories = normalized
            .into_iter()
            .map(|nc| {
                let existing = self
                    .by_name
                    .get(&nc.name)
                    .map(|&idx| &self.categories[idx]);
                let subcategories = nc
                    .subcategories
                    .into_iter()
                    .map(|name| {
                        let id = existing
                            .and_then(|c| c.subcategory(name.as_str()))
                            .map(|s| s.id)
                            .unwrap_or_else(SubCategoryId::new);
                        SubCategory { id, name }
                    })
                    .collect();
                Category {
                    id: existing.map(|c| c.id).unwrap_or_else(CategoryId::new),
                    name: nc.name,
                    subcategories,
                }
            })
            .collect();

        Ok(Self::assemble(
            self.id,
            self.version,
            self.updated_at,
            categories,
        ))
    }

    /// Replace one category's subcategory list, appending the category if it is new.
    pub fn with_category(
        &self,
        name: &str,
        subcategories: Vec<String>,
    ) -> Result<Self, TaxonomyError> {
        let mut doc = self.document();
        doc.upsert(name, subcategories);
        self.replaced_with(&doc)
    }

    /// Remove a category together with all of its subcategories.
    pub fn without_category(&self, name: &str) -> Result<Self, TaxonomyError> {
        if self.category(name).is_none() {
            return Err(TaxonomyError::CategoryNotFound(name.to_string()));
        }
        let mut doc = self.document();
        doc.remove(name);
        self.replaced_with(&doc)
    }

    /// Rename a category in place; its id and subcategories are kept.
    pub fn with_category_renamed(&self, from: &str, to: &str) -> Result<Self, TaxonomyError> {
        let idx = self
            .category_index(from)
            .ok_or_else(|| TaxonomyError::CategoryNotFound(from.to_string()))?;
        let new_name = CategoryName::parse(to)
            .ok_or(ValidationError::EmptyCategoryName { position: idx })?;

        let mut categories = self.categories.clone();
        categories[idx].name = new_name;
        self.checked(categories)
    }

    /// Rename a subcategory in place; its id is kept.
    pub fn with_subcategory_renamed(
        &self,
        category: &str,
        from: &str,
        to: &str,
    ) -> Result<Self, TaxonomyError> {
        let idx = self
            .category_index(category)
            .ok_or_else(|| TaxonomyError::CategoryNotFound(category.to_string()))?;
        let owner = &self.categories[idx];
        let sub_idx = owner
            .subcategories
            .iter()
            .position(|s| s.name.as_str() == from.trim())
            .ok_or_else(|| TaxonomyError::SubCategoryNotFound {
                category: owner.name.to_string(),
                subcategory: from.to_string(),
            })?;
        let new_name = SubCategoryName::parse(to).ok_or_else(|| {
            ValidationError::EmptySubCategoryName {
                category: owner.name.to_string(),
                position: sub_idx,
            }
        })?;

        let mut categories = self.categories.clone();
        categories[idx].subcategories[sub_idx].name = new_name;
        self.checked(categories)
    }

    fn category_index(&self, name: &str) -> Option<usize> {
        let key = CategoryName::parse(name)?;
        self.by_name.get(&key).copied()
    }

    fn checked(&self, categories: Vec<Category>) -> Result<Self, TaxonomyError> {
        let candidate = Self::assemble(self.id, self.version, self.updated_at, categories);
        validate::validate(&candidate.document())?;
        Ok(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    fn sample() -> Taxonomy {
        let doc = TaxonomyDocument::new()
            .with("SALONS", &["Salon en L", "Salon en U"])
            .with("CHAMBRE", &["Lits", "Matelas"]);
        Taxonomy::initial(&doc, now()).unwrap()
    }

    #[test]
    fn seeded_taxonomy_matches_seed_document() {
        let t = Taxonomy::seeded(now()).unwrap();
        assert_eq!(t.version(), 1);
        assert_eq!(t.document(), seed_document());
        assert_eq!(t.categories()[0].name().as_str(), "TOUS");
    }

    #[test]
    fn category_lookup_is_case_insensitive() {
        let t = sample();
        assert!(t.category("salons").is_some());
        assert!(t.category("  Chambre ").is_some());
        assert!(t.category("DECO").is_none());
        assert!(t.category("   ").is_none());
    }

    #[test]
    fn replace_keeps_ids_of_surviving_names() {
        let t = sample();
        let salons = t.category("SALONS").unwrap().clone();
        let salon_l = salons.subcategory("Salon en L").unwrap().id();

        let doc = TaxonomyDocument::new()
            .with("salons", &["Salon en L", "Salon d'angle"])
            .with("DECO", &["Mirroirs"]);
        let next = t.replaced_with(&doc).unwrap();

        let next_salons = next.category("SALONS").unwrap();
        assert_eq!(next_salons.id(), salons.id());
        assert_eq!(next_salons.subcategory("Salon en L").unwrap().id(), salon_l);
        assert!(next_salons.subcategory("Salon en U").is_none());
        assert!(next.category("CHAMBRE").is_none());
        assert_eq!(next.version(), t.version());
    }

    #[test]
    fn replacing_with_own_document_is_same_content() {
        let t = sample();
        let again = t.replaced_with(&t.document()).unwrap();
        assert!(again.same_content(&t));
    }

    #[test]
    fn replace_rejects_invalid_document() {
        let t = sample();
        let doc = TaxonomyDocument::new().with("SALONS", &["Salon en L", "Salon en L"]);
        assert!(matches!(
            t.replaced_with(&doc),
            Err(TaxonomyError::Validation(ValidationError::DuplicateSubCategory { .. }))
        ));
    }

    #[test]
    fn rename_category_keeps_id_and_subcategories() {
        let t = sample();
        let id = t.category("SALONS").unwrap().id();
        let renamed = t.with_category_renamed("salons", "Salons & Séjours").unwrap();

        assert!(renamed.category("SALONS").is_none());
        let c = renamed.category("SALONS & SÉJOURS").unwrap();
        assert_eq!(c.id(), id);
        assert_eq!(c.subcategory_names(), vec!["Salon en L", "Salon en U"]);
        assert_eq!(renamed.categories()[0].id(), id);
    }

    #[test]
    fn rename_category_onto_existing_name_is_rejected() {
        let t = sample();
        assert!(matches!(
            t.with_category_renamed("SALONS", "chambre"),
            Err(TaxonomyError::Validation(ValidationError::DuplicateCategoryName { .. }))
        ));
    }

    #[test]
    fn rename_missing_category_is_not_found() {
        assert!(matches!(
            sample().with_category_renamed("JARDIN", "EXTERIEUR"),
            Err(TaxonomyError::CategoryNotFound(_))
        ));
    }

    #[test]
    fn rename_subcategory_keeps_id() {
        let t = sample();
        let id = t.category("CHAMBRE").unwrap().subcategory("Lits").unwrap().id();
        let renamed = t.with_subcategory_renamed("CHAMBRE", "Lits", "Lits Doubles").unwrap();
        let c = renamed.category("CHAMBRE").unwrap();
        assert_eq!(c.subcategory("Lits Doubles").unwrap().id(), id);
        assert!(c.subcategory("Lits").is_none());
    }

    #[test]
    fn rename_subcategory_to_blank_is_rejected() {
        assert!(matches!(
            sample().with_subcategory_renamed("CHAMBRE", "Lits", "  "),
            Err(TaxonomyError::Validation(ValidationError::EmptySubCategoryName { .. }))
        ));
    }

    #[test]
    fn with_category_upserts_in_place_or_appends() {
        let t = sample();
        let updated = t
            .with_category("chambre", vec!["Lits".into(), "Commodes".into()])
            .unwrap();
        assert_eq!(updated.categories()[1].subcategory_names(), vec!["Lits", "Commodes"]);

        let appended = updated.with_category("DECO", vec![]).unwrap();
        assert_eq!(appended.categories().len(), 3);
        assert_eq!(appended.categories()[2].name().as_str(), "DECO");
    }

    #[test]
    fn without_category_drops_category_and_subcategories() {
        let t = sample();
        let next = t.without_category("Salons").unwrap();
        assert_eq!(next.document(), TaxonomyDocument::new().with("CHAMBRE", &["Lits", "Matelas"]));
        assert!(matches!(
            next.without_category("SALONS"),
            Err(TaxonomyError::CategoryNotFound(_))
        ));
    }

    #[test]
    fn snapshot_round_trip_preserves_everything() {
        let t = sample().committed(4, now());
        let json = serde_json::to_string(&t.to_snapshot()).unwrap();
        let snapshot: TaxonomySnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(Taxonomy::from_snapshot(snapshot).unwrap(), t);
    }

    #[test]
    fn snapshot_with_duplicate_ids_is_corrupt() {
        let t = sample();
        let mut snapshot = t.to_snapshot();
        let dup = snapshot.categories[0].clone();
        snapshot.categories[1].id = dup.id;
        assert!(matches!(
            Taxonomy::from_snapshot(snapshot),
            Err(TaxonomyError::Corrupt(_))
        ));
    }

    #[test]
    fn snapshot_with_unnormalized_name_is_corrupt() {
        let mut snapshot = sample().to_snapshot();
        snapshot.categories[0].name = serde_json::from_str("\"salons\"").unwrap();
        assert!(matches!(
            Taxonomy::from_snapshot(snapshot),
            Err(TaxonomyError::Corrupt(_))
        ));
    }
}
