use std::sync::Arc;

use anyhow::Context;
use axum::http::StatusCode;
use axum::response::Response;

use atelier_infra::{
    EditError, FileTaxonomyStore, InMemoryProductCatalog, InMemoryTaxonomyStore, ProductCatalog,
    TaxonomyEditor, TaxonomyStore,
};

use crate::app::errors;
use crate::config::ApiConfig;

pub type SharedStore = Arc<dyn TaxonomyStore>;
pub type SharedCatalog = Arc<dyn ProductCatalog>;
pub type Editor = TaxonomyEditor<SharedStore, SharedCatalog>;

pub struct AppServices {
    pub editor: Editor,
    /// Mutations without `If-Match` are refused with 428.
    pub require_if_match: bool,
}

impl AppServices {
    pub fn new(store: SharedStore, catalog: SharedCatalog, require_if_match: bool) -> Self {
        Self {
            editor: TaxonomyEditor::new(store, catalog),
            require_if_match,
        }
    }

    pub fn from_config(config: &ApiConfig) -> anyhow::Result<Self> {
        let store: SharedStore = match &config.store_path {
            Some(path) => Arc::new(
                FileTaxonomyStore::open(path)
                    .with_context(|| format!("failed to open taxonomy store {}", path.display()))?,
            ),
            None => {
                tracing::warn!("TAXONOMY_STORE_PATH not set; taxonomy is kept in memory only");
                Arc::new(InMemoryTaxonomyStore::seeded().context("failed to seed taxonomy")?)
            }
        };

        let catalog: SharedCatalog = match &config.products_path {
            Some(path) => Arc::new(
                InMemoryProductCatalog::from_json_file(path)
                    .with_context(|| format!("failed to load products {}", path.display()))?,
            ),
            None => Arc::new(InMemoryProductCatalog::new()),
        };

        Ok(Self::new(store, catalog, config.require_if_match))
    }

    /// Run an editor call on the blocking pool; store I/O and the editor lock
    /// stay off the async workers.
    pub async fn run<T, F>(self: &Arc<Self>, op: F) -> Result<T, Response>
    where
        T: Send + 'static,
        F: FnOnce(&Editor) -> Result<T, EditError> + Send + 'static,
    {
        let services = Arc::clone(self);
        match tokio::task::spawn_blocking(move || op(&services.editor)).await {
            Ok(result) => result.map_err(errors::edit_error_to_response),
            Err(e) => {
                tracing::error!(error = %e, "editor task failed");
                Err(errors::json_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "editor task failed",
                ))
            }
        }
    }
}
