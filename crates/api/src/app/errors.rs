use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use serde_json::json;

use atelier_infra::EditError;

use crate::app::dto;

pub fn edit_error_to_response(err: EditError) -> axum::response::Response {
    match err {
        EditError::Validation(e) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string())
        }
        EditError::NotFound(msg) => json_error(StatusCode::NOT_FOUND, "not_found", msg),
        EditError::Conflict { actual, .. } => {
            let message = format!("taxonomy was modified; current version is {actual}");
            let mut response = (
                StatusCode::PRECONDITION_FAILED,
                axum::Json(json!({
                    "error": "version_conflict",
                    "message": message,
                    "current_version": actual,
                })),
            )
                .into_response();
            if let Some(etag) = dto::etag(actual) {
                response.headers_mut().insert(header::ETAG, etag);
            }
            response
        }
        EditError::Consistency(e) => (
            StatusCode::CONFLICT,
            axum::Json(json!({
                "error": "orphaned_products",
                "message": e.to_string(),
                "orphans": e.orphans,
            })),
        )
            .into_response(),
        EditError::Storage(e) => {
            tracing::error!(error = %e, "taxonomy store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string())
        }
        EditError::Catalog(e) => {
            tracing::error!(error = %e, "product catalog failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "catalog_error", e.to_string())
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn precondition_required() -> axum::response::Response {
    json_error(
        StatusCode::PRECONDITION_REQUIRED,
        "precondition_required",
        "this endpoint requires an If-Match header carrying the taxonomy version",
    )
}
