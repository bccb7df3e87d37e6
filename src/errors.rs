use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("the requested time slot is not available")]
    SlotNotAvailable,

    #[error("booking not found: {0}")]
    BookingNotFound(String),

    #[error("booking is already cancelled")]
    BookingAlreadyCancelled,

    #[error("service not found: {0}")]
    ServiceNotFound(String),

    #[error("staff not found: {0}")]
    StaffNotFound(String),

    #[error("business not found: {0}")]
    BusinessNotFound(String),

    #[error("customer not found: {0}")]
    CustomerNotFound(String),

    #[error("a customer with this email already exists")]
    CustomerEmailExists,

    #[error("{0}")]
    BadRequest(String),

    #[error("validation failed")]
    ValidationFailed(Vec<FieldError>),

    #[error("unauthorized")]
    Unauthorized,

    #[error("database error: {0}")]
    Database(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for ApiError {
    fn from(e: rusqlite::Error) -> Self {
        ApiError::Database(e.into())
    }
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::SlotNotAvailable => "SLOT_NOT_AVAILABLE",
            ApiError::BookingNotFound(_) => "BOOKING_NOT_FOUND",
            ApiError::BookingAlreadyCancelled => "BOOKING_ALREADY_CANCELLED",
            ApiError::ServiceNotFound(_) => "SERVICE_NOT_FOUND",
            ApiError::StaffNotFound(_) => "STAFF_NOT_FOUND",
            ApiError::BusinessNotFound(_) => "BUSINESS_NOT_FOUND",
            ApiError::CustomerNotFound(_) => "CUSTOMER_NOT_FOUND",
            ApiError::CustomerEmailExists => "CUSTOMER_EMAIL_EXISTS",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationFailed(_) => "VALIDATION_FAILED",
            ApiError::Unauthorized => "UNAUTHORIZED",
            ApiError::Database(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::SlotNotAvailable | ApiError::CustomerEmailExists => StatusCode::CONFLICT,
            ApiError::BookingNotFound(_)
            | ApiError::ServiceNotFound(_)
            | ApiError::StaffNotFound(_)
            | ApiError::BusinessNotFound(_)
            | ApiError::CustomerNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BookingAlreadyCancelled
            | ApiError::BadRequest(_)
            | ApiError::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let validation_errors = match &self {
            ApiError::ValidationFailed(errors) => errors.clone(),
            _ => vec![],
        };

        if matches!(self, ApiError::Database(_)) {
            tracing::error!(error = %self, "internal error");
        }

        let body = serde_json::json!({
            "success": false,
            "data": null,
            "error": { "code": self.code(), "message": self.to_string() },
            "validation_errors": validation_errors,
            "status": status.as_u16(),
        });
        (status, Json(body)).into_response()
    }
}
