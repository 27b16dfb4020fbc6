use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use warehouse_core::DomainError;
use warehouse_infra::StoreError;

use crate::app::services::ServiceError;

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::Domain(e) => domain_error_to_response(e),
        ServiceError::Store(e) => store_error_to_response(e),
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::InvalidPlacement(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invalid_placement", msg)
        }
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
    }
}

fn store_error_to_response(err: StoreError) -> axum::response::Response {
    tracing::error!("store operation failed: {err}");
    match err {
        StoreError::Unavailable(msg) => {
            json_error(StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", msg)
        }
        other => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "store_error",
            other.to_string(),
        ),
    }
}

/// Unwrap an extracted JSON body; a body that does not parse is a validation error.
pub fn json_body<T>(
    body: Result<Json<T>, JsonRejection>,
) -> Result<T, axum::response::Response> {
    body.map(|Json(value)| value).map_err(|rejection| {
        json_error(StatusCode::BAD_REQUEST, "validation_error", rejection.body_text())
    })
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
