use serde::{Deserialize, Serialize};

use atelier_core::{CategoryId, CategoryName, SubCategoryId};

/// Product identifier as issued by the storefront database.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

fn default_active() -> bool {
    true
}

/// Catalog product, reduced to what the taxonomy cares about.
///
/// `main_category` / `sub_category` are the names the storefront displays.
/// When `category_id` / `sub_category_id` are present they are authoritative
/// and the names are only a display cache; rows written before ids existed
/// are linked by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    #[serde(rename = "ref")]
    pub reference: String,
    pub name: String,
    pub main_category: String,
    pub sub_category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_category_id: Option<SubCategoryId>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl Product {
    /// Name-linked product (legacy shape).
    pub fn new(
        id: impl Into<String>,
        reference: impl Into<String>,
        name: impl Into<String>,
        main_category: impl Into<String>,
        sub_category: impl Into<String>,
    ) -> Self {
        Self {
            id: ProductId::new(id),
            reference: reference.into(),
            name: name.into(),
            main_category: main_category.into(),
            sub_category: sub_category.into(),
            category_id: None,
            sub_category_id: None,
            is_active: true,
        }
    }

    /// Attach stable taxonomy ids.
    pub fn with_links(mut self, category_id: CategoryId, sub_category_id: SubCategoryId) -> Self {
        self.category_id = Some(category_id);
        self.sub_category_id = Some(sub_category_id);
        self
    }

    /// Whether this product points at the given category.
    pub fn links_category(&self, category_id: CategoryId, category_name: &str) -> bool {
        match self.category_id {
            Some(id) => id == category_id,
            None => CategoryName::normalize(&self.main_category) == CategoryName::normalize(category_name),
        }
    }

    /// Whether this product points at the given subcategory of the given category.
    pub fn links_subcategory(
        &self,
        category_id: CategoryId,
        category_name: &str,
        sub_category_id: SubCategoryId,
        sub_category_name: &str,
    ) -> bool {
        if !self.links_category(category_id, category_name) {
            return false;
        }
        match self.sub_category_id {
            Some(id) => id == sub_category_id,
            None => self.sub_category.trim() == sub_category_name.trim(),
        }
    }
}
