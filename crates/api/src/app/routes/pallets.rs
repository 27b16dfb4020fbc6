use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use warehouse_core::PalletId;

use crate::app::{dto, errors};
use crate::app::services::WarehouseService;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_pallets).post(create_pallet))
        .route("/:id", get(get_pallet).delete(delete_pallet))
        .route("/:id/boxes", post(create_box))
}

fn parse_pallet_id(id: &str) -> Result<PalletId, axum::response::Response> {
    id.parse()
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid pallet id"))
}

pub async fn list_pallets(
    Extension(services): Extension<Arc<WarehouseService>>,
) -> axum::response::Response {
    match services.list_pallets().await {
        Ok(pallets) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "count": pallets.len(),
                "pallets": pallets.iter().map(dto::pallet_to_json).collect::<Vec<_>>(),
            })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_pallet(
    Extension(services): Extension<Arc<WarehouseService>>,
    body: Result<Json<dto::CreatePalletRequest>, JsonRejection>,
) -> axum::response::Response {
    let body = match errors::json_body(body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    if let Err(e) = body.validate() {
        return errors::domain_error_to_response(e);
    }

    let dims = body.dimensions;
    match services.create_pallet(dims.width, dims.height, dims.depth).await {
        Ok(pallet) => (StatusCode::CREATED, Json(dto::pallet_to_json(&pallet))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_pallet(
    Extension(services): Extension<Arc<WarehouseService>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_pallet_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.get_pallet(id).await {
        Ok(pallet) => (StatusCode::OK, Json(dto::pallet_to_json(&pallet))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_pallet(
    Extension(services): Extension<Arc<WarehouseService>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_pallet_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.delete_pallet(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_box(
    Extension(services): Extension<Arc<WarehouseService>>,
    Path(id): Path<String>,
    body: Result<Json<dto::CreateBoxRequest>, JsonRejection>,
) -> axum::response::Response {
    let pallet_id = match parse_pallet_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let body = match errors::json_body(body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let new_box = match body.into_new_box() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.create_box(pallet_id, new_box).await {
        Ok(pallet) => (StatusCode::CREATED, Json(dto::pallet_to_json(&pallet))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
