use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use atelier_core::{AggregateRoot, ExpectedVersion};
use atelier_infra::EditOptions;
use atelier_taxonomy::{Category, OrphanedProductRef, Taxonomy};

use crate::app::errors;

pub const ORPHANED_PRODUCTS_HEADER: HeaderName = HeaderName::from_static("x-orphaned-products");

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Default, Deserialize)]
pub struct ForceQuery {
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Deserialize)]
pub struct PutCategoryRequest {
    pub subcategories: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub name: String,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: String,
    pub name: String,
    pub subcategories: Vec<String>,
}

impl From<&Category> for CategoryResponse {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id().to_string(),
            name: category.name().to_string(),
            subcategories: category.subcategory_names(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrphansResponse {
    pub orphans: Vec<OrphanedProductRef>,
}

// -------------------------
// Header + body helpers
// -------------------------

pub fn etag(version: u64) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!("\"{version}\"")).ok()
}

/// Parse `If-Match` into a version expectation.
///
/// Accepts `"<version>"`, `W/"<version>"`, a bare number, or `*`.
pub fn parse_if_match(headers: &HeaderMap) -> Result<Option<ExpectedVersion>, Response> {
    let Some(raw) = headers.get(header::IF_MATCH) else {
        return Ok(None);
    };
    let invalid = || {
        errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_if_match",
            "If-Match must carry a single taxonomy version, e.g. \"3\"",
        )
    };

    let value = raw.to_str().map_err(|_| invalid())?.trim();
    if value == "*" {
        return Ok(Some(ExpectedVersion::Any));
    }
    let value = value.strip_prefix("W/").unwrap_or(value);
    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value);
    value
        .parse::<u64>()
        .map(|v| Some(ExpectedVersion::Exact(v)))
        .map_err(|_| invalid())
}

/// Resolve edit options from the request headers and `?force=`.
pub fn edit_options(
    headers: &HeaderMap,
    force: &ForceQuery,
    require_if_match: bool,
) -> Result<EditOptions, Response> {
    let expected = match parse_if_match(headers)? {
        Some(expected) => expected,
        None if require_if_match => return Err(errors::precondition_required()),
        None => ExpectedVersion::Any,
    };
    Ok(EditOptions {
        expected,
        force: force.force,
    })
}

/// Unwrap a JSON body, answering malformed input with the standard error shape.
pub fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    body.map(|Json(value)| value).map_err(|rejection| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_json", rejection.body_text())
    })
}

/// The full document with its version as `ETag`.
pub fn document_response(taxonomy: &Taxonomy, orphaned: usize) -> Response {
    let mut response = (StatusCode::OK, Json(taxonomy.document())).into_response();
    let headers = response.headers_mut();
    if let Some(etag) = etag(taxonomy.version()) {
        headers.insert(header::ETAG, etag);
    }
    if orphaned > 0 {
        headers.insert(ORPHANED_PRODUCTS_HEADER, HeaderValue::from(orphaned));
    }
    response
}
