use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Availability query result; produced fresh on every request, never cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub slots: Vec<TimeSlot>,
}
