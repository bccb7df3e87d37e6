use chrono::{Duration, NaiveDateTime};

use crate::models::{Booking, BookingStatus};

/// The time a booking actually blocks on the staff calendar: its interval
/// padded by the buffers snapshotted from its service. Buffers belong to the
/// existing booking's footprint, never to the candidate being tested.
#[derive(Debug, Clone, PartialEq)]
pub struct Footprint {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Footprint {
    pub fn of(booking: &Booking) -> Self {
        Self {
            start: booking.start_time - Duration::minutes(booking.buffer_before_minutes as i64),
            end: booking.end_time + Duration::minutes(booking.buffer_after_minutes as i64),
        }
    }
}

/// Half-open interval overlap: touching endpoints do not conflict.
pub fn overlaps(
    candidate_start: &NaiveDateTime,
    candidate_end: &NaiveDateTime,
    footprint: &Footprint,
) -> bool {
    footprint.start < *candidate_end && footprint.end > *candidate_start
}

/// First existing booking whose footprint collides with `[start, end)`.
/// Cancelled bookings never block; every other status represents occupied
/// time. `exclude_id` lets a reschedule ignore the booking's own interval.
pub fn find_conflict<'a>(
    start: &NaiveDateTime,
    end: &NaiveDateTime,
    existing: &'a [Booking],
    exclude_id: Option<&str>,
) -> Option<&'a Booking> {
    existing.iter().find(|b| {
        b.status != BookingStatus::Cancelled
            && exclude_id != Some(b.id.as_str())
            && overlaps(start, end, &Footprint::of(b))
    })
}
