use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Success side of the uniform response envelope. The failure side lives in
/// [`crate::errors::ApiError`].
pub fn ok<T: Serialize>(data: T) -> Response {
    envelope(StatusCode::OK, data)
}

pub fn created<T: Serialize>(data: T) -> Response {
    envelope(StatusCode::CREATED, data)
}

fn envelope<T: Serialize>(status: StatusCode, data: T) -> Response {
    let body = serde_json::json!({
        "success": true,
        "data": data,
        "error": null,
        "validation_errors": [],
        "status": status.as_u16(),
    });
    (status, Json(body)).into_response()
}
