//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store selection and the warehouse application service
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::Config;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(config: &Config) -> anyhow::Result<Router> {
    let services = services::build_services(config).await?;
    Ok(build_router(Arc::new(services)))
}

/// Router over an already wired service (also used by the black-box tests).
pub fn build_router(services: Arc<services::WarehouseService>) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(Extension(services))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}
