use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::db::queries;
use crate::errors::{ApiError, FieldError};
use crate::handlers::check_auth;
use crate::models::Customer;
use crate::response;
use crate::state::AppState;

// POST /api/businesses/:business_id/customers
#[derive(Deserialize)]
pub struct CreateCustomerPayload {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

pub async fn create_customer(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(business_id): Path<String>,
    Json(payload): Json<CreateCustomerPayload>,
) -> Result<Response, ApiError> {
    check_auth(&headers, &state.config.admin_token)?;

    if payload.name.trim().is_empty() {
        return Err(ApiError::ValidationFailed(vec![FieldError::new(
            "name",
            "name is required",
        )]));
    }

    let db = state.db.lock().unwrap();
    queries::get_business(&db, &business_id)?
        .ok_or_else(|| ApiError::BusinessNotFound(business_id.clone()))?;

    let email = payload.email.as_deref().map(str::trim).filter(|e| !e.is_empty());
    if let Some(email) = email {
        if queries::get_customer_by_email(&db, &business_id, email)?.is_some() {
            return Err(ApiError::CustomerEmailExists);
        }
    }

    let now = Utc::now().naive_utc();
    let customer = Customer {
        id: Uuid::new_v4().to_string(),
        business_id: business_id.clone(),
        name: payload.name.trim().to_string(),
        email: email.map(|e| e.to_string()),
        phone: payload.phone,
        tags: payload.tags,
        total_bookings: 0,
        total_spent_cents: 0,
        last_visit_at: None,
        created_at: now,
        updated_at: now,
    };
    queries::create_customer(&db, &customer)?;
    Ok(response::created(customer))
}

// GET /api/businesses/:business_id/customers
#[derive(Deserialize)]
pub struct CustomersQuery {
    pub limit: Option<i64>,
}

pub async fn list_customers(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(business_id): Path<String>,
    Query(query): Query<CustomersQuery>,
) -> Result<Response, ApiError> {
    check_auth(&headers, &state.config.admin_token)?;

    let db = state.db.lock().unwrap();
    queries::get_business(&db, &business_id)?
        .ok_or_else(|| ApiError::BusinessNotFound(business_id.clone()))?;
    let customers = queries::list_customers(&db, &business_id, query.limit.unwrap_or(100))?;
    Ok(response::ok(customers))
}

// GET /api/businesses/:business_id/customers/:id
pub async fn get_customer(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((business_id, customer_id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    check_auth(&headers, &state.config.admin_token)?;

    let db = state.db.lock().unwrap();
    let customer = queries::get_customer(&db, &business_id, &customer_id)?
        .ok_or_else(|| ApiError::CustomerNotFound(customer_id))?;
    Ok(response::ok(customer))
}

// GET /api/businesses/:business_id/customers/:id/bookings
//
// Full visit history, cancelled bookings included, oldest first.
pub async fn customer_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((business_id, customer_id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    check_auth(&headers, &state.config.admin_token)?;

    let db = state.db.lock().unwrap();
    queries::get_customer(&db, &business_id, &customer_id)?
        .ok_or_else(|| ApiError::CustomerNotFound(customer_id.clone()))?;
    let history = queries::get_customer_bookings(&db, &customer_id)?;
    Ok(response::ok(history))
}
