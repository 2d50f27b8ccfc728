//! Read-only product catalog access.
//!
//! The storefront owns product rows; the taxonomy only queries them to find
//! products linked to a category or subcategory that an edit touches.

use std::path::Path;
use std::sync::{Arc, RwLock};

use thiserror::Error;

use atelier_core::{CategoryId, SubCategoryId};
use atelier_products::Product;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read products file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse products file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("product catalog lock poisoned")]
    Poisoned,
}

pub trait ProductCatalog: Send + Sync {
    fn list(&self) -> Result<Vec<Product>, CatalogError>;

    /// Products linked to the category, by id or (for rows without one) by name.
    fn find_by_category(
        &self,
        category_id: CategoryId,
        category_name: &str,
    ) -> Result<Vec<Product>, CatalogError>;

    /// Products linked to the subcategory within the category.
    fn find_by_subcategory(
        &self,
        category_id: CategoryId,
        category_name: &str,
        sub_category_id: SubCategoryId,
        sub_category_name: &str,
    ) -> Result<Vec<Product>, CatalogError>;
}

impl<S> ProductCatalog for Arc<S>
where
    S: ProductCatalog + ?Sized,
{
    fn list(&self) -> Result<Vec<Product>, CatalogError> {
        (**self).list()
    }

    fn find_by_category(
        &self,
        category_id: CategoryId,
        category_name: &str,
    ) -> Result<Vec<Product>, CatalogError> {
        (**self).find_by_category(category_id, category_name)
    }

    fn find_by_subcategory(
        &self,
        category_id: CategoryId,
        category_name: &str,
        sub_category_id: SubCategoryId,
        sub_category_name: &str,
    ) -> Result<Vec<Product>, CatalogError> {
        (**self).find_by_subcategory(category_id, category_name, sub_category_id, sub_category_name)
    }
}

/// In-memory catalog for tests/dev, optionally loaded from a JSON export.
#[derive(Debug, Default)]
pub struct InMemoryProductCatalog {
    inner: RwLock<Vec<Product>>,
}

impl InMemoryProductCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(products: Vec<Product>) -> Self {
        Self {
            inner: RwLock::new(products),
        }
    }

    /// Load a JSON array of products in the storefront's export shape.
    pub fn from_json_file(path: &Path) -> Result<Self, CatalogError> {
        let bytes = std::fs::read(path)?;
        let products: Vec<Product> = serde_json::from_slice(&bytes)?;
        tracing::info!(path = %path.display(), products = products.len(), "loaded product catalog");
        Ok(Self::with_products(products))
    }

    fn filtered(&self, keep: impl Fn(&Product) -> bool) -> Result<Vec<Product>, CatalogError> {
        let products = self.inner.read().map_err(|_| {
            tracing::error!("product catalog lock poisoned");
            CatalogError::Poisoned
        })?;
        Ok(products.iter().filter(|&p| keep(p)).cloned().collect())
    }
}

impl ProductCatalog for InMemoryProductCatalog {
    fn list(&self) -> Result<Vec<Product>, CatalogError> {
        self.filtered(|_| true)
    }

    fn find_by_category(
        &self,
        category_id: CategoryId,
        category_name: &str,
    ) -> Result<Vec<Product>, CatalogError> {
        self.filtered(|p| p.links_category(category_id, category_name))
    }

    fn find_by_subcategory(
        &self,
        category_id: CategoryId,
        category_name: &str,
        sub_category_id: SubCategoryId,
        sub_category_name: &str,
    ) -> Result<Vec<Product>, CatalogError> {
        self.filtered(|p| {
            p.links_subcategory(category_id, category_name, sub_category_id, sub_category_name)
        })
    }
}
