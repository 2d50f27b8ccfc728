use axum::Router;

pub mod categories;
pub mod products;
pub mod system;

/// Router for all taxonomy endpoints (requests arrive already authorized).
pub fn router() -> Router {
    Router::new()
        .merge(categories::router())
        .merge(products::router())
}
