use chrono::{Duration, NaiveDateTime};
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::queries;
use crate::errors::{ApiError, FieldError};
use crate::models::{Booking, BookingStatus, Customer, Staff};
use crate::services::{conflict, stats};

/// The booking ledger. Every mutation runs inside one transaction spanning
/// lookups, the conflict check, the write, and the aggregate recompute; the
/// caller holds the connection mutex for the whole call, so two overlapping
/// create requests for the same staff member can never both pass the check.
///
/// `now` is the business-local clock, supplied by the caller.

#[derive(Debug, Clone)]
pub struct CreateBookingRequest {
    pub service_id: String,
    pub staff_id: String,
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub start_time: NaiveDateTime,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateBookingRequest {
    pub staff_id: Option<String>,
    pub start_time: Option<NaiveDateTime>,
    pub notes: Option<String>,
}

pub fn create(
    conn: &mut Connection,
    business_id: &str,
    req: &CreateBookingRequest,
    now: NaiveDateTime,
) -> Result<Booking, ApiError> {
    let tx = conn.transaction().map_err(anyhow::Error::from)?;

    let service = queries::get_service(&tx, business_id, &req.service_id)?
        .ok_or_else(|| ApiError::ServiceNotFound(req.service_id.clone()))?;
    let staff = queries::get_staff(&tx, business_id, &req.staff_id)?
        .ok_or_else(|| ApiError::StaffNotFound(req.staff_id.clone()))?;

    if service.duration_minutes <= 0 {
        return Err(ApiError::ValidationFailed(vec![FieldError::new(
            "service_id",
            "service duration must be positive",
        )]));
    }

    let start = req.start_time;
    let end = start + Duration::minutes(service.duration_minutes as i64);

    check_horizon(&service, &start, &now)?;

    // Outside the staff member's working hours there is nothing to book.
    if !staff.schedule().contains(&start, &end) {
        return Err(ApiError::SlotNotAvailable);
    }

    let customer = resolve_customer(&tx, business_id, req, &now)?;

    check_conflict(&tx, &staff, &start, &end, None)?;

    let booking = Booking {
        id: Uuid::new_v4().to_string(),
        business_id: business_id.to_string(),
        customer_id: customer.id.clone(),
        staff_id: staff.id.clone(),
        service_id: service.id.clone(),
        start_time: start,
        end_time: end,
        // Auto-confirm: pending exists for workflows that want an explicit
        // staff confirmation step, which this deployment does not use.
        status: BookingStatus::Confirmed,
        price_cents: service.price_cents,
        currency: service.currency.clone(),
        buffer_before_minutes: service.buffer_before_minutes,
        buffer_after_minutes: service.buffer_after_minutes,
        notes: req.notes.clone(),
        cancel_reason: None,
        cancelled_at: None,
        cancelled_by: None,
        created_at: now,
        updated_at: now,
    };

    queries::create_booking(&tx, &booking)?;
    stats::recompute_customer(&tx, &customer.id)?;
    tx.commit().map_err(anyhow::Error::from)?;

    tracing::info!(booking_id = %booking.id, staff_id = %booking.staff_id, "booking created");
    Ok(booking)
}

pub fn update(
    conn: &mut Connection,
    business_id: &str,
    booking_id: &str,
    req: &UpdateBookingRequest,
    now: NaiveDateTime,
) -> Result<Booking, ApiError> {
    let tx = conn.transaction().map_err(anyhow::Error::from)?;

    let mut booking = queries::get_booking(&tx, business_id, booking_id)?
        .ok_or_else(|| ApiError::BookingNotFound(booking_id.to_string()))?;

    if booking.status.is_terminal() {
        return Err(ApiError::BadRequest(format!(
            "cannot reschedule a {} booking",
            booking.status.as_str()
        )));
    }

    let staff = match &req.staff_id {
        Some(id) => queries::get_staff(&tx, business_id, id)?
            .ok_or_else(|| ApiError::StaffNotFound(id.clone()))?,
        None => queries::get_staff(&tx, business_id, &booking.staff_id)?
            .ok_or_else(|| ApiError::StaffNotFound(booking.staff_id.clone()))?,
    };

    let rescheduled = req.start_time.is_some() || req.staff_id.is_some();
    if rescheduled {
        // The booked duration is a snapshot; service edits after the fact
        // must not stretch or shrink an existing booking.
        let duration = Duration::minutes(booking.duration_minutes());
        let start = req.start_time.unwrap_or(booking.start_time);
        let end = start + duration;

        if !staff.schedule().contains(&start, &end) {
            return Err(ApiError::SlotNotAvailable);
        }
        check_conflict(&tx, &staff, &start, &end, Some(&booking.id))?;

        booking.staff_id = staff.id.clone();
        booking.start_time = start;
        booking.end_time = end;
    }

    if let Some(notes) = &req.notes {
        booking.notes = Some(notes.clone());
    }
    booking.updated_at = now;

    queries::save_booking(&tx, &booking)?;
    stats::recompute_customer(&tx, &booking.customer_id)?;
    tx.commit().map_err(anyhow::Error::from)?;

    Ok(booking)
}

pub fn cancel(
    conn: &mut Connection,
    business_id: &str,
    booking_id: &str,
    reason: Option<&str>,
    actor: Option<&str>,
    now: NaiveDateTime,
) -> Result<Booking, ApiError> {
    let tx = conn.transaction().map_err(anyhow::Error::from)?;

    let mut booking = queries::get_booking(&tx, business_id, booking_id)?
        .ok_or_else(|| ApiError::BookingNotFound(booking_id.to_string()))?;

    match booking.status {
        // Explicit error rather than a silent no-op, so racing callers can
        // tell they lost.
        BookingStatus::Cancelled => return Err(ApiError::BookingAlreadyCancelled),
        BookingStatus::Completed | BookingStatus::NoShow => {
            return Err(ApiError::BadRequest(format!(
                "cannot cancel a {} booking",
                booking.status.as_str()
            )));
        }
        BookingStatus::Pending | BookingStatus::Confirmed => {}
    }

    booking.status = BookingStatus::Cancelled;
    booking.cancel_reason = reason.map(|r| r.to_string());
    booking.cancelled_at = Some(now);
    booking.cancelled_by = actor.map(|a| a.to_string());
    booking.updated_at = now;

    queries::save_booking(&tx, &booking)?;
    stats::recompute_customer(&tx, &booking.customer_id)?;
    tx.commit().map_err(anyhow::Error::from)?;

    tracing::info!(booking_id = %booking.id, "booking cancelled");
    Ok(booking)
}

pub fn confirm(
    conn: &mut Connection,
    business_id: &str,
    booking_id: &str,
    now: NaiveDateTime,
) -> Result<Booking, ApiError> {
    transition(conn, business_id, booking_id, now, |status| match status {
        BookingStatus::Pending => Ok(BookingStatus::Confirmed),
        other => Err(invalid_transition(other, "confirm")),
    })
}

/// Strict completion: a pending booking must be confirmed first.
pub fn complete(
    conn: &mut Connection,
    business_id: &str,
    booking_id: &str,
    now: NaiveDateTime,
) -> Result<Booking, ApiError> {
    transition(conn, business_id, booking_id, now, |status| match status {
        BookingStatus::Confirmed => Ok(BookingStatus::Completed),
        other => Err(invalid_transition(other, "complete")),
    })
}

pub fn mark_no_show(
    conn: &mut Connection,
    business_id: &str,
    booking_id: &str,
    now: NaiveDateTime,
) -> Result<Booking, ApiError> {
    transition(conn, business_id, booking_id, now, |status| match status {
        BookingStatus::Confirmed => Ok(BookingStatus::NoShow),
        other => Err(invalid_transition(other, "mark as no-show")),
    })
}

fn invalid_transition(from: BookingStatus, verb: &str) -> ApiError {
    ApiError::BadRequest(format!("cannot {verb} a {} booking", from.as_str()))
}

fn transition(
    conn: &mut Connection,
    business_id: &str,
    booking_id: &str,
    now: NaiveDateTime,
    next: impl Fn(BookingStatus) -> Result<BookingStatus, ApiError>,
) -> Result<Booking, ApiError> {
    let tx = conn.transaction().map_err(anyhow::Error::from)?;

    let mut booking = queries::get_booking(&tx, business_id, booking_id)?
        .ok_or_else(|| ApiError::BookingNotFound(booking_id.to_string()))?;

    booking.status = next(booking.status)?;
    booking.updated_at = now;

    queries::save_booking(&tx, &booking)?;
    stats::recompute_customer(&tx, &booking.customer_id)?;
    tx.commit().map_err(anyhow::Error::from)?;

    Ok(booking)
}

fn check_horizon(
    service: &crate::models::Service,
    start: &NaiveDateTime,
    now: &NaiveDateTime,
) -> Result<(), ApiError> {
    let earliest = *now + Duration::hours(service.min_advance_hours as i64);
    if *start < earliest {
        return Err(ApiError::ValidationFailed(vec![FieldError::new(
            "start_time",
            format!(
                "bookings require at least {} hours notice",
                service.min_advance_hours
            ),
        )]));
    }
    let latest = *now + Duration::days(service.max_advance_days as i64);
    if *start > latest {
        return Err(ApiError::ValidationFailed(vec![FieldError::new(
            "start_time",
            format!(
                "bookings cannot be made more than {} days ahead",
                service.max_advance_days
            ),
        )]));
    }
    Ok(())
}

fn check_conflict(
    conn: &Connection,
    staff: &Staff,
    start: &NaiveDateTime,
    end: &NaiveDateTime,
    exclude_id: Option<&str>,
) -> Result<(), ApiError> {
    // Window padded a day each side so neighbouring buffers are in scope.
    let from = *start - Duration::days(1);
    let to = *end + Duration::days(1);
    let existing = queries::get_staff_bookings_in_range(conn, &staff.id, &from, &to)?;

    if conflict::find_conflict(start, end, &existing, exclude_id).is_some() {
        return Err(ApiError::SlotNotAvailable);
    }
    Ok(())
}

fn resolve_customer(
    conn: &Connection,
    business_id: &str,
    req: &CreateBookingRequest,
    now: &NaiveDateTime,
) -> Result<Customer, ApiError> {
    if let Some(id) = &req.customer_id {
        return queries::get_customer(conn, business_id, id)?
            .ok_or_else(|| ApiError::CustomerNotFound(id.clone()));
    }

    let Some(email) = req.customer_email.as_deref().map(str::trim).filter(|e| !e.is_empty())
    else {
        return Err(ApiError::ValidationFailed(vec![
            FieldError::new("customer_id", "customer_id or customer_email is required"),
            FieldError::new("customer_email", "customer_id or customer_email is required"),
        ]));
    };

    // Guest flow: reuse the existing record for this email, else create one.
    if let Some(existing) = queries::get_customer_by_email(conn, business_id, email)? {
        return Ok(existing);
    }

    let Some(name) = req.customer_name.as_deref().map(str::trim).filter(|n| !n.is_empty())
    else {
        return Err(ApiError::ValidationFailed(vec![FieldError::new(
            "customer_name",
            "customer_name is required for a new guest booking",
        )]));
    };

    let customer = Customer {
        id: Uuid::new_v4().to_string(),
        business_id: business_id.to_string(),
        name: name.to_string(),
        email: Some(email.to_string()),
        phone: req.customer_phone.clone(),
        tags: vec![],
        total_bookings: 0,
        total_spent_cents: 0,
        last_visit_at: None,
        created_at: *now,
        updated_at: *now,
    };
    queries::create_customer(conn, &customer)?;
    Ok(customer)
}
