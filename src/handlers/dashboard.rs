use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Response;

use crate::db::queries;
use crate::errors::ApiError;
use crate::handlers::check_auth;
use crate::response;
use crate::services::stats;
use crate::state::AppState;

// GET /api/businesses/:business_id/dashboard
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(business_id): Path<String>,
) -> Result<Response, ApiError> {
    check_auth(&headers, &state.config.admin_token)?;

    let db = state.db.lock().unwrap();
    let business = queries::get_business(&db, &business_id)?
        .ok_or_else(|| ApiError::BusinessNotFound(business_id.clone()))?;

    let today = business.local_now().date();
    let dashboard = stats::dashboard_stats(&db, &business_id, today)?;
    Ok(response::ok(dashboard))
}
