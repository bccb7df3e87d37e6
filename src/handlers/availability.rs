use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::Response;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::ApiError;
use crate::response;
use crate::services::availability;
use crate::state::AppState;

// GET /api/businesses/:business_id/availability
#[derive(Deserialize)]
pub struct AvailabilityQuery {
    pub service_id: String,
    pub staff_id: Option<String>,
    pub date: NaiveDate,
}

pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    Path(business_id): Path<String>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Response, ApiError> {
    let db = state.db.lock().unwrap();

    let business = queries::get_business(&db, &business_id)?
        .ok_or_else(|| ApiError::BusinessNotFound(business_id.clone()))?;

    let day = availability::get_availability(
        &db,
        &business_id,
        &query.service_id,
        query.staff_id.as_deref(),
        query.date,
        state.config.slot_granularity_minutes,
        business.local_now(),
    )?;

    Ok(response::ok(day))
}
