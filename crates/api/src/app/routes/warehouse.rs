use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use crate::app::{dto, errors};
use crate::app::services::WarehouseService;

/// All pallets, grouped by expiration day, plus the pallets with the
/// longest-keeping boxes.
pub async fn overview(
    Extension(services): Extension<Arc<WarehouseService>>,
) -> axum::response::Response {
    match services.overview().await {
        Ok(overview) => (StatusCode::OK, Json(dto::overview_to_json(&overview))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
