use axum::{routing::get, Router};

pub mod boxes;
pub mod pallets;
pub mod system;
pub mod warehouse;

/// Router for all warehouse endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/warehouse", get(warehouse::overview))
        .nest("/pallets", pallets::router())
        .nest("/boxes", boxes::router())
}
