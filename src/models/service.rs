use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub business_id: String,
    pub name: String,
    pub duration_minutes: i32,
    pub price_cents: i64,
    pub currency: String,
    /// Buffers extend a booking's busy footprint without widening the booked
    /// interval itself.
    pub buffer_before_minutes: i32,
    pub buffer_after_minutes: i32,
    pub min_advance_hours: i32,
    pub max_advance_days: i32,
    pub active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
