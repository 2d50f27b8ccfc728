use std::sync::Arc;

use axum::{Json, Router, extract::Extension, response::IntoResponse, routing::get};

use crate::app::dto;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new().route("/products/orphans", get(list_orphans))
}

/// Products whose category or subcategory no longer resolves.
pub async fn list_orphans(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.run(|editor| editor.dangling()).await {
        Ok(orphans) => Json(dto::OrphansResponse { orphans }).into_response(),
        Err(resp) => resp,
    }
}
