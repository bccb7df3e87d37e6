use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::ApiError;
use crate::models::{Booking, DayAvailability, Staff, TimeSlot};
use crate::services::{calendar, conflict};

/// Free/busy grid for a (business, service, optional staff, date) query.
///
/// Staff policy: with a staff id the grid is that member's alone; without
/// one, per-staff grids across all active staff are computed and unioned (a
/// slot is available when any member is free in it). Slots outside the
/// service's booking horizon relative to `now` (business-local clock) are
/// reported busy, so a `true` answer always admits an immediate `create`.
/// Read-only; the write path re-validates, so a `true` here is never a
/// reservation.
pub fn get_availability(
    conn: &Connection,
    business_id: &str,
    service_id: &str,
    staff_id: Option<&str>,
    date: NaiveDate,
    granularity_minutes: Option<i64>,
    now: NaiveDateTime,
) -> Result<DayAvailability, ApiError> {
    let service = queries::get_service(conn, business_id, service_id)?
        .ok_or_else(|| ApiError::ServiceNotFound(service_id.to_string()))?;

    let earliest = now + Duration::hours(service.min_advance_hours as i64);
    let latest = now + Duration::days(service.max_advance_days as i64);

    let members: Vec<Staff> = match staff_id {
        Some(id) => {
            let member = queries::get_staff(conn, business_id, id)?
                .ok_or_else(|| ApiError::StaffNotFound(id.to_string()))?;
            vec![member]
        }
        None => queries::list_active_staff(conn, business_id)?,
    };

    // Union by interval: available wins over busy for the same slot.
    let mut merged: BTreeMap<(chrono::NaiveDateTime, chrono::NaiveDateTime), bool> =
        BTreeMap::new();

    for member in &members {
        let grid = calendar::slot_grid(
            date,
            &member.schedule(),
            service.duration_minutes as i64,
            granularity_minutes,
        );
        if grid.is_empty() {
            continue;
        }

        let existing = day_bookings(conn, &member.id, date)?;

        for slot in grid {
            let in_horizon = slot.start >= earliest && slot.start <= latest;
            let free = in_horizon
                && conflict::find_conflict(&slot.start, &slot.end, &existing, None).is_none();
            merged
                .entry((slot.start, slot.end))
                .and_modify(|available| *available |= free)
                .or_insert(free);
        }
    }

    Ok(DayAvailability {
        date,
        slots: merged
            .into_iter()
            .map(|((start, end), available)| TimeSlot {
                start,
                end,
                available,
            })
            .collect(),
    })
}

/// Staff bookings overlapping the date, window padded a day each side so
/// buffers spilling across midnight are still seen.
fn day_bookings(
    conn: &Connection,
    staff_id: &str,
    date: NaiveDate,
) -> Result<Vec<Booking>, ApiError> {
    let day_start = date.and_hms_opt(0, 0, 0).expect("valid midnight");
    let from = day_start - Duration::days(1);
    let to = day_start + Duration::days(2);
    Ok(queries::get_staff_bookings_in_range(conn, staff_id, &from, &to)?)
}
