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
use crate::models::{Service, Staff, WorkingHours};
use crate::response;
use crate::state::AppState;

// ── Services ──

// POST /api/businesses/:business_id/services
#[derive(Deserialize)]
pub struct CreateServicePayload {
    pub name: String,
    pub duration_minutes: i32,
    #[serde(default)]
    pub price_cents: i64,
    pub currency: Option<String>,
    #[serde(default)]
    pub buffer_before_minutes: i32,
    #[serde(default)]
    pub buffer_after_minutes: i32,
    #[serde(default)]
    pub min_advance_hours: i32,
    pub max_advance_days: Option<i32>,
}

fn validate_service(payload: &CreateServicePayload) -> Result<(), ApiError> {
    let mut errors = vec![];
    if payload.name.trim().is_empty() {
        errors.push(FieldError::new("name", "name is required"));
    }
    if payload.duration_minutes <= 0 {
        errors.push(FieldError::new(
            "duration_minutes",
            "duration must be positive",
        ));
    }
    if payload.buffer_before_minutes < 0 || payload.buffer_after_minutes < 0 {
        errors.push(FieldError::new(
            "buffer_before_minutes",
            "buffers cannot be negative",
        ));
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::ValidationFailed(errors))
    }
}

pub async fn create_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(business_id): Path<String>,
    Json(payload): Json<CreateServicePayload>,
) -> Result<Response, ApiError> {
    check_auth(&headers, &state.config.admin_token)?;
    validate_service(&payload)?;

    let db = state.db.lock().unwrap();
    queries::get_business(&db, &business_id)?
        .ok_or_else(|| ApiError::BusinessNotFound(business_id.clone()))?;

    let now = Utc::now().naive_utc();
    let service = Service {
        id: Uuid::new_v4().to_string(),
        business_id: business_id.clone(),
        name: payload.name.trim().to_string(),
        duration_minutes: payload.duration_minutes,
        price_cents: payload.price_cents,
        currency: payload.currency.unwrap_or_else(|| "USD".to_string()),
        buffer_before_minutes: payload.buffer_before_minutes,
        buffer_after_minutes: payload.buffer_after_minutes,
        min_advance_hours: payload.min_advance_hours,
        max_advance_days: payload.max_advance_days.unwrap_or(90),
        active: true,
        created_at: now,
        updated_at: now,
    };
    queries::create_service(&db, &service)?;
    Ok(response::created(service))
}

// GET /api/businesses/:business_id/services
pub async fn list_services(
    State(state): State<Arc<AppState>>,
    Path(business_id): Path<String>,
) -> Result<Response, ApiError> {
    let db = state.db.lock().unwrap();
    queries::get_business(&db, &business_id)?
        .ok_or_else(|| ApiError::BusinessNotFound(business_id.clone()))?;
    let services = queries::list_services(&db, &business_id)?;
    Ok(response::ok(services))
}

// PATCH /api/businesses/:business_id/services/:id
//
// Administrative edit. Existing bookings keep their snapshotted
// price/duration/buffers; only future creations see the new values.
#[derive(Deserialize)]
pub struct UpdateServicePayload {
    pub name: Option<String>,
    pub duration_minutes: Option<i32>,
    pub price_cents: Option<i64>,
    pub currency: Option<String>,
    pub buffer_before_minutes: Option<i32>,
    pub buffer_after_minutes: Option<i32>,
    pub min_advance_hours: Option<i32>,
    pub max_advance_days: Option<i32>,
    pub active: Option<bool>,
}

pub async fn update_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((business_id, service_id)): Path<(String, String)>,
    Json(payload): Json<UpdateServicePayload>,
) -> Result<Response, ApiError> {
    check_auth(&headers, &state.config.admin_token)?;

    let db = state.db.lock().unwrap();
    let mut service = queries::get_service(&db, &business_id, &service_id)?
        .ok_or_else(|| ApiError::ServiceNotFound(service_id))?;

    if let Some(name) = payload.name {
        service.name = name;
    }
    if let Some(duration) = payload.duration_minutes {
        if duration <= 0 {
            return Err(ApiError::ValidationFailed(vec![FieldError::new(
                "duration_minutes",
                "duration must be positive",
            )]));
        }
        service.duration_minutes = duration;
    }
    if let Some(price) = payload.price_cents {
        service.price_cents = price;
    }
    if let Some(currency) = payload.currency {
        service.currency = currency;
    }
    if let Some(buffer) = payload.buffer_before_minutes {
        service.buffer_before_minutes = buffer;
    }
    if let Some(buffer) = payload.buffer_after_minutes {
        service.buffer_after_minutes = buffer;
    }
    if let Some(hours) = payload.min_advance_hours {
        service.min_advance_hours = hours;
    }
    if let Some(days) = payload.max_advance_days {
        service.max_advance_days = days;
    }
    if let Some(active) = payload.active {
        service.active = active;
    }

    queries::update_service(&db, &service)?;
    Ok(response::ok(service))
}

// ── Staff ──

// POST /api/businesses/:business_id/staff
#[derive(Deserialize)]
pub struct CreateStaffPayload {
    pub name: String,
    pub working_hours: Option<serde_json::Value>,
}

fn encode_working_hours(value: &serde_json::Value) -> Result<String, ApiError> {
    let json = value.to_string();
    WorkingHours::from_json(&json).map_err(|e| {
        ApiError::ValidationFailed(vec![FieldError::new("working_hours", e.to_string())])
    })?;
    Ok(json)
}

pub async fn create_staff(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(business_id): Path<String>,
    Json(payload): Json<CreateStaffPayload>,
) -> Result<Response, ApiError> {
    check_auth(&headers, &state.config.admin_token)?;

    if payload.name.trim().is_empty() {
        return Err(ApiError::ValidationFailed(vec![FieldError::new(
            "name",
            "name is required",
        )]));
    }
    let working_hours = payload
        .working_hours
        .as_ref()
        .map(encode_working_hours)
        .transpose()?;

    let db = state.db.lock().unwrap();
    queries::get_business(&db, &business_id)?
        .ok_or_else(|| ApiError::BusinessNotFound(business_id.clone()))?;

    let now = Utc::now().naive_utc();
    let staff = Staff {
        id: Uuid::new_v4().to_string(),
        business_id: business_id.clone(),
        name: payload.name.trim().to_string(),
        working_hours,
        active: true,
        created_at: now,
        updated_at: now,
    };
    queries::create_staff(&db, &staff)?;
    Ok(response::created(staff))
}

// GET /api/businesses/:business_id/staff
pub async fn list_staff(
    State(state): State<Arc<AppState>>,
    Path(business_id): Path<String>,
) -> Result<Response, ApiError> {
    let db = state.db.lock().unwrap();
    queries::get_business(&db, &business_id)?
        .ok_or_else(|| ApiError::BusinessNotFound(business_id.clone()))?;
    let members = queries::list_active_staff(&db, &business_id)?;
    Ok(response::ok(members))
}

// PATCH /api/businesses/:business_id/staff/:id
#[derive(Deserialize)]
pub struct UpdateStaffPayload {
    pub name: Option<String>,
    pub working_hours: Option<serde_json::Value>,
    pub active: Option<bool>,
}

pub async fn update_staff(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((business_id, staff_id)): Path<(String, String)>,
    Json(payload): Json<UpdateStaffPayload>,
) -> Result<Response, ApiError> {
    check_auth(&headers, &state.config.admin_token)?;

    let db = state.db.lock().unwrap();
    let mut staff = queries::get_staff(&db, &business_id, &staff_id)?
        .ok_or_else(|| ApiError::StaffNotFound(staff_id))?;

    if let Some(name) = payload.name {
        staff.name = name;
    }
    if let Some(hours) = &payload.working_hours {
        staff.working_hours = Some(encode_working_hours(hours)?);
    }
    if let Some(active) = payload.active {
        staff.active = active;
    }

    queries::update_staff(&db, &staff)?;
    Ok(response::ok(staff))
}
