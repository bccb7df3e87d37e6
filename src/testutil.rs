//! Seed helpers shared by the unit tests. Compiled only for tests.

use chrono::NaiveDateTime;
use rusqlite::Connection;

use crate::db::queries;
use crate::models::{Booking, BookingStatus, Business, Customer, Service, Staff};

fn seed_time() -> NaiveDateTime {
    NaiveDateTime::parse_from_str("2025-06-01 00:00:00", "%Y-%m-%d %H:%M:%S").unwrap()
}

pub fn seed_business(conn: &Connection, id: &str) {
    let now = seed_time();
    queries::create_business(
        conn,
        &Business {
            id: id.to_string(),
            name: format!("{id} salon"),
            timezone: "UTC".to_string(),
            utc_offset_minutes: 0,
            created_at: now,
            updated_at: now,
        },
    )
    .unwrap();
}

pub fn seed_service(
    conn: &Connection,
    business_id: &str,
    id: &str,
    duration_minutes: i32,
    buffer_before: i32,
    buffer_after: i32,
) {
    let now = seed_time();
    queries::create_service(
        conn,
        &Service {
            id: id.to_string(),
            business_id: business_id.to_string(),
            name: format!("{id} service"),
            duration_minutes,
            price_cents: 2500,
            currency: "USD".to_string(),
            buffer_before_minutes: buffer_before,
            buffer_after_minutes: buffer_after,
            min_advance_hours: 0,
            max_advance_days: 90,
            active: true,
            created_at: now,
            updated_at: now,
        },
    )
    .unwrap();
}

/// Working-hours JSON with the same window every day of the week.
pub fn weekday_hours(start: &str, end: &str) -> String {
    let days: Vec<String> = (0..7)
        .map(|weekday| {
            format!(
                r#"{{"weekday":{weekday},"start":"{start}","end":"{end}","enabled":true}}"#
            )
        })
        .collect();
    format!(r#"{{"days":[{}]}}"#, days.join(","))
}

pub fn seed_staff(conn: &Connection, business_id: &str, id: &str, working_hours: String) {
    let now = seed_time();
    queries::create_staff(
        conn,
        &Staff {
            id: id.to_string(),
            business_id: business_id.to_string(),
            name: id.to_string(),
            working_hours: Some(working_hours),
            active: true,
            created_at: now,
            updated_at: now,
        },
    )
    .unwrap();
}

pub fn seed_customer(conn: &Connection, business_id: &str, id: &str, email: &str) {
    let now = seed_time();
    queries::create_customer(
        conn,
        &Customer {
            id: id.to_string(),
            business_id: business_id.to_string(),
            name: id.to_string(),
            email: Some(email.to_string()),
            phone: None,
            tags: vec![],
            total_bookings: 0,
            total_spent_cents: 0,
            last_visit_at: None,
            created_at: now,
            updated_at: now,
        },
    )
    .unwrap();
}

/// Confirmed booking with price and buffers snapshotted from the service row.
#[allow(clippy::too_many_arguments)]
pub fn seed_booking(
    conn: &Connection,
    business_id: &str,
    id: &str,
    customer_id: &str,
    staff_id: &str,
    service_id: &str,
    start: &str,
    duration_minutes: i64,
) {
    let now = seed_time();
    let service = queries::get_service(conn, business_id, service_id)
        .unwrap()
        .unwrap();
    let start_time = NaiveDateTime::parse_from_str(&format!("{start}:00"), "%Y-%m-%d %H:%M:%S")
        .unwrap_or_else(|_| NaiveDateTime::parse_from_str(start, "%Y-%m-%d %H:%M:%S").unwrap());
    queries::create_booking(
        conn,
        &Booking {
            id: id.to_string(),
            business_id: business_id.to_string(),
            customer_id: customer_id.to_string(),
            staff_id: staff_id.to_string(),
            service_id: service_id.to_string(),
            start_time,
            end_time: start_time + chrono::Duration::minutes(duration_minutes),
            status: BookingStatus::Confirmed,
            price_cents: service.price_cents,
            currency: service.currency,
            buffer_before_minutes: service.buffer_before_minutes,
            buffer_after_minutes: service.buffer_after_minutes,
            notes: None,
            cancel_reason: None,
            cancelled_at: None,
            cancelled_by: None,
            created_at: now,
            updated_at: now,
        },
    )
    .unwrap();
}
