pub mod availability;
pub mod bookings;
pub mod businesses;
pub mod catalog;
pub mod customers;
pub mod dashboard;
pub mod events;
pub mod health;

use axum::http::HeaderMap;

use crate::errors::ApiError;

/// Bearer-token gate for staff-facing endpoints. Real identity is an
/// external collaborator; the core only needs to trust that the caller may
/// act for the business.
pub fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), ApiError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token != expected_token {
        return Err(ApiError::Unauthorized);
    }
    Ok(())
}
