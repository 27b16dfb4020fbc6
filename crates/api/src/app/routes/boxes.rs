use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::delete,
    Router,
};

use warehouse_core::BoxId;

use crate::app::errors;
use crate::app::services::WarehouseService;

pub fn router() -> Router {
    Router::new().route("/:id", delete(delete_box))
}

pub async fn delete_box(
    Extension(services): Extension<Arc<WarehouseService>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let box_id: BoxId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid box id"),
    };

    match services.delete_box(box_id).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
