use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Response;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::db::queries;
use crate::errors::{ApiError, FieldError};
use crate::handlers::check_auth;
use crate::models::Business;
use crate::response;
use crate::state::AppState;

// POST /api/businesses
#[derive(Deserialize)]
pub struct CreateBusinessPayload {
    pub name: String,
    pub timezone: Option<String>,
    pub utc_offset_minutes: Option<i32>,
}

pub async fn create_business(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<CreateBusinessPayload>,
) -> Result<Response, ApiError> {
    check_auth(&headers, &state.config.admin_token)?;

    if payload.name.trim().is_empty() {
        return Err(ApiError::ValidationFailed(vec![FieldError::new(
            "name",
            "name is required",
        )]));
    }

    let now = Utc::now().naive_utc();
    let business = Business {
        id: Uuid::new_v4().to_string(),
        name: payload.name.trim().to_string(),
        timezone: payload.timezone.unwrap_or_else(|| "UTC".to_string()),
        utc_offset_minutes: payload.utc_offset_minutes.unwrap_or(0),
        created_at: now,
        updated_at: now,
    };

    let db = state.db.lock().unwrap();
    queries::create_business(&db, &business)?;
    Ok(response::created(business))
}

// GET /api/businesses/:business_id
pub async fn get_business(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(business_id): Path<String>,
) -> Result<Response, ApiError> {
    check_auth(&headers, &state.config.admin_token)?;

    let db = state.db.lock().unwrap();
    let business = queries::get_business(&db, &business_id)?
        .ok_or_else(|| ApiError::BusinessNotFound(business_id))?;
    Ok(response::ok(business))
}
