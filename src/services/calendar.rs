use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::models::staff::weekday_index;
use crate::models::WorkingHours;

/// Candidate booking interval, half-open `[start, end)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// Candidate slot grid for one date. Slots are `duration_minutes` long and
/// advance by `granularity_minutes` when set, otherwise by the duration
/// itself. The last slot is the latest start that still fits a full duration
/// before the working window closes. Pure function of its inputs.
pub fn slot_grid(
    date: NaiveDate,
    hours: &WorkingHours,
    duration_minutes: i64,
    granularity_minutes: Option<i64>,
) -> Vec<Slot> {
    if duration_minutes <= 0 {
        return vec![];
    }

    let Some((window_start, window_end)) = hours.window_for(weekday_index(&date)) else {
        return vec![];
    };

    let duration = Duration::minutes(duration_minutes);
    let step = Duration::minutes(granularity_minutes.unwrap_or(duration_minutes));

    let day_end = date.and_time(window_end);
    let mut cursor = date.and_time(window_start);
    let mut slots = vec![];

    while cursor + duration <= day_end {
        slots.push(Slot {
            start: cursor,
            end: cursor + duration,
        });
        cursor += step;
    }

    slots
}
