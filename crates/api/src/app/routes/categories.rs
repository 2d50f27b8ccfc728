use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query, rejection::JsonRejection},
    http::{HeaderMap, header},
    response::IntoResponse,
    routing::{get, post},
};

use atelier_core::AggregateRoot;
use atelier_infra::{EditError, EditOutcome};
use atelier_taxonomy::TaxonomyDocument;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/categories", get(get_document).put(replace_document))
        .route(
            "/categories/:category",
            get(get_category).put(put_category).delete(delete_category),
        )
        .route("/categories/:category/rename", post(rename_category))
        .route(
            "/categories/:category/subcategories/:subcategory/rename",
            post(rename_subcategory),
        )
        .route("/impact", post(preview_replace))
}

fn outcome_response(result: Result<EditOutcome, axum::response::Response>) -> axum::response::Response {
    match result {
        Ok(outcome) => dto::document_response(&outcome.taxonomy, outcome.orphaned.len()),
        Err(resp) => resp,
    }
}

pub async fn get_document(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.run(|editor| editor.current()).await {
        Ok(taxonomy) => dto::document_response(&taxonomy, 0),
        Err(resp) => resp,
    }
}

pub async fn replace_document(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
    Query(force): Query<dto::ForceQuery>,
    body: Result<Json<TaxonomyDocument>, JsonRejection>,
) -> axum::response::Response {
    let options = match dto::edit_options(&headers, &force, services.require_if_match) {
        Ok(o) => o,
        Err(resp) => return resp,
    };
    let doc = match dto::json_body(body) {
        Ok(d) => d,
        Err(resp) => return resp,
    };

    outcome_response(services.run(move |editor| editor.replace(&doc, options)).await)
}

/// Dry run of a replace: which products it would orphan.
pub async fn preview_replace(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<TaxonomyDocument>, JsonRejection>,
) -> axum::response::Response {
    let doc = match dto::json_body(body) {
        Ok(d) => d,
        Err(resp) => return resp,
    };

    match services.run(move |editor| editor.preview(&doc)).await {
        Ok(orphans) => Json(dto::OrphansResponse { orphans }).into_response(),
        Err(resp) => resp,
    }
}

pub async fn get_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(category): Path<String>,
) -> axum::response::Response {
    let taxonomy = match services.run(|editor| editor.current()).await {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    let Some(found) = taxonomy.category(&category) else {
        return errors::edit_error_to_response(EditError::NotFound(format!(
            "category not found: {category}"
        )));
    };

    let mut response = Json(dto::CategoryResponse::from(found)).into_response();
    if let Some(etag) = dto::etag(taxonomy.version()) {
        response.headers_mut().insert(header::ETAG, etag);
    }
    response
}

pub async fn put_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(category): Path<String>,
    headers: HeaderMap,
    Query(force): Query<dto::ForceQuery>,
    body: Result<Json<dto::PutCategoryRequest>, JsonRejection>,
) -> axum::response::Response {
    let options = match dto::edit_options(&headers, &force, services.require_if_match) {
        Ok(o) => o,
        Err(resp) => return resp,
    };
    let body = match dto::json_body(body) {
        Ok(b) => b,
        Err(resp) => return resp,
    };

    outcome_response(
        services
            .run(move |editor| editor.put_category(&category, body.subcategories, options))
            .await,
    )
}

pub async fn delete_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(category): Path<String>,
    headers: HeaderMap,
    Query(force): Query<dto::ForceQuery>,
) -> axum::response::Response {
    let options = match dto::edit_options(&headers, &force, services.require_if_match) {
        Ok(o) => o,
        Err(resp) => return resp,
    };

    outcome_response(
        services
            .run(move |editor| editor.delete_category(&category, options))
            .await,
    )
}

pub async fn rename_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(category): Path<String>,
    headers: HeaderMap,
    Query(force): Query<dto::ForceQuery>,
    body: Result<Json<dto::RenameRequest>, JsonRejection>,
) -> axum::response::Response {
    let options = match dto::edit_options(&headers, &force, services.require_if_match) {
        Ok(o) => o,
        Err(resp) => return resp,
    };
    let body = match dto::json_body(body) {
        Ok(b) => b,
        Err(resp) => return resp,
    };

    outcome_response(
        services
            .run(move |editor| editor.rename_category(&category, &body.name, options))
            .await,
    )
}

pub async fn rename_subcategory(
    Extension(services): Extension<Arc<AppServices>>,
    Path((category, subcategory)): Path<(String, String)>,
    headers: HeaderMap,
    Query(force): Query<dto::ForceQuery>,
    body: Result<Json<dto::RenameRequest>, JsonRejection>,
) -> axum::response::Response {
    let options = match dto::edit_options(&headers, &force, services.require_if_match) {
        Ok(o) => o,
        Err(resp) => return resp,
    };
    let body = match dto::json_body(body) {
        Ok(b) => b,
        Err(resp) => return resp,
    };

    outcome_response(
        services
            .run(move |editor| {
                editor.rename_subcategory(&category, &subcategory, &body.name, options)
            })
            .await,
    )
}
