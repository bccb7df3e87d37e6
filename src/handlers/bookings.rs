use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use axum::Json;
use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::{ApiError, FieldError};
use crate::events::{BookingEvent, BookingEventKind};
use crate::handlers::check_auth;
use crate::models::{Business, TIME_FMT};
use crate::response;
use crate::services::bookings;
use crate::state::AppState;

fn parse_start(s: &str) -> Result<NaiveDateTime, ApiError> {
    NaiveDateTime::parse_from_str(s, TIME_FMT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M"))
        .map_err(|_| {
            ApiError::ValidationFailed(vec![FieldError::new(
                "start_time",
                "expected YYYY-MM-DD HH:MM in the business's local time",
            )])
        })
}

fn load_business(db: &rusqlite::Connection, business_id: &str) -> Result<Business, ApiError> {
    queries::get_business(db, business_id)?
        .ok_or_else(|| ApiError::BusinessNotFound(business_id.to_string()))
}

// POST /api/businesses/:business_id/bookings
#[derive(Deserialize)]
pub struct CreateBookingPayload {
    pub service_id: String,
    pub staff_id: String,
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub start_time: String,
    pub notes: Option<String>,
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Path(business_id): Path<String>,
    Json(payload): Json<CreateBookingPayload>,
) -> Result<Response, ApiError> {
    let request = bookings::CreateBookingRequest {
        service_id: payload.service_id,
        staff_id: payload.staff_id,
        customer_id: payload.customer_id,
        customer_name: payload.customer_name,
        customer_email: payload.customer_email,
        customer_phone: payload.customer_phone,
        start_time: parse_start(&payload.start_time)?,
        notes: payload.notes,
    };

    let booking = {
        let mut db = state.db.lock().unwrap();
        let business = load_business(&db, &business_id)?;
        let now = business.local_now();
        bookings::create(&mut db, &business_id, &request, now)?
    };

    state.emit(BookingEvent::new(
        &business_id,
        &booking.id,
        BookingEventKind::Created,
    ));
    Ok(response::created(booking))
}

// GET /api/businesses/:business_id/bookings
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(business_id): Path<String>,
    Query(query): Query<BookingsQuery>,
) -> Result<Response, ApiError> {
    check_auth(&headers, &state.config.admin_token)?;

    let db = state.db.lock().unwrap();
    load_business(&db, &business_id)?;
    let list = queries::list_bookings(
        &db,
        &business_id,
        query.status.as_deref(),
        query.limit.unwrap_or(50),
    )?;
    Ok(response::ok(list))
}

// PATCH /api/businesses/:business_id/bookings/:id
#[derive(Deserialize)]
pub struct UpdateBookingPayload {
    pub staff_id: Option<String>,
    pub start_time: Option<String>,
    pub notes: Option<String>,
}

pub async fn update_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((business_id, booking_id)): Path<(String, String)>,
    Json(payload): Json<UpdateBookingPayload>,
) -> Result<Response, ApiError> {
    check_auth(&headers, &state.config.admin_token)?;

    let start_time = payload.start_time.as_deref().map(parse_start).transpose()?;
    let request = bookings::UpdateBookingRequest {
        staff_id: payload.staff_id,
        start_time,
        notes: payload.notes,
    };

    let booking = {
        let mut db = state.db.lock().unwrap();
        let business = load_business(&db, &business_id)?;
        let now = business.local_now();
        bookings::update(&mut db, &business_id, &booking_id, &request, now)?
    };
    Ok(response::ok(booking))
}

// POST /api/businesses/:business_id/bookings/:id/cancel
#[derive(Deserialize, Default)]
pub struct CancelPayload {
    pub reason: Option<String>,
    pub actor: Option<String>,
}

pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((business_id, booking_id)): Path<(String, String)>,
    payload: Option<Json<CancelPayload>>,
) -> Result<Response, ApiError> {
    check_auth(&headers, &state.config.admin_token)?;
    let Json(payload) = payload.unwrap_or_default();

    let booking = {
        let mut db = state.db.lock().unwrap();
        let business = load_business(&db, &business_id)?;
        let now = business.local_now();
        bookings::cancel(
            &mut db,
            &business_id,
            &booking_id,
            payload.reason.as_deref(),
            payload.actor.as_deref(),
            now,
        )?
    };

    state.emit(BookingEvent::new(
        &business_id,
        &booking.id,
        BookingEventKind::Cancelled,
    ));
    Ok(response::ok(booking))
}

// POST /api/businesses/:business_id/bookings/:id/confirm
pub async fn confirm_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((business_id, booking_id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    check_auth(&headers, &state.config.admin_token)?;

    let booking = {
        let mut db = state.db.lock().unwrap();
        let business = load_business(&db, &business_id)?;
        let now = business.local_now();
        bookings::confirm(&mut db, &business_id, &booking_id, now)?
    };
    Ok(response::ok(booking))
}

// POST /api/businesses/:business_id/bookings/:id/complete
pub async fn complete_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((business_id, booking_id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    check_auth(&headers, &state.config.admin_token)?;

    let booking = {
        let mut db = state.db.lock().unwrap();
        let business = load_business(&db, &business_id)?;
        let now = business.local_now();
        bookings::complete(&mut db, &business_id, &booking_id, now)?
    };

    state.emit(BookingEvent::new(
        &business_id,
        &booking.id,
        BookingEventKind::Completed,
    ));
    Ok(response::ok(booking))
}

// POST /api/businesses/:business_id/bookings/:id/no-show
pub async fn no_show_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((business_id, booking_id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    check_auth(&headers, &state.config.admin_token)?;

    let booking = {
        let mut db = state.db.lock().unwrap();
        let business = load_business(&db, &business_id)?;
        let now = business.local_now();
        bookings::mark_no_show(&mut db, &business_id, &booking_id, now)?
    };
    Ok(response::ok(booking))
}
