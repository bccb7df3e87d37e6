use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection};

use crate::models::{Booking, BookingStatus, Business, Customer, Service, Staff, TIME_FMT};

fn fmt(dt: &NaiveDateTime) -> String {
    dt.format(TIME_FMT).to_string()
}

fn parse_dt(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, TIME_FMT).unwrap_or_else(|_| Utc::now().naive_utc())
}

// ── Businesses ──

pub fn create_business(conn: &Connection, business: &Business) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO businesses (id, name, timezone, utc_offset_minutes, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            business.id,
            business.name,
            business.timezone,
            business.utc_offset_minutes,
            fmt(&business.created_at),
            fmt(&business.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_business(conn: &Connection, id: &str) -> anyhow::Result<Option<Business>> {
    let result = conn.query_row(
        "SELECT id, name, timezone, utc_offset_minutes, created_at, updated_at
         FROM businesses WHERE id = ?1",
        params![id],
        |row| {
            Ok(Business {
                id: row.get(0)?,
                name: row.get(1)?,
                timezone: row.get(2)?,
                utc_offset_minutes: row.get(3)?,
                created_at: parse_dt(&row.get::<_, String>(4)?),
                updated_at: parse_dt(&row.get::<_, String>(5)?),
            })
        },
    );

    match result {
        Ok(business) => Ok(Some(business)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// ── Services ──

pub fn create_service(conn: &Connection, service: &Service) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO services (id, business_id, name, duration_minutes, price_cents, currency,
                               buffer_before_minutes, buffer_after_minutes, min_advance_hours,
                               max_advance_days, active, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            service.id,
            service.business_id,
            service.name,
            service.duration_minutes,
            service.price_cents,
            service.currency,
            service.buffer_before_minutes,
            service.buffer_after_minutes,
            service.min_advance_hours,
            service.max_advance_days,
            service.active as i32,
            fmt(&service.created_at),
            fmt(&service.updated_at),
        ],
    )?;
    Ok(())
}

pub fn update_service(conn: &Connection, service: &Service) -> anyhow::Result<bool> {
    let now = fmt(&Utc::now().naive_utc());
    let count = conn.execute(
        "UPDATE services SET name = ?1, duration_minutes = ?2, price_cents = ?3, currency = ?4,
                buffer_before_minutes = ?5, buffer_after_minutes = ?6, min_advance_hours = ?7,
                max_advance_days = ?8, active = ?9, updated_at = ?10
         WHERE id = ?11 AND business_id = ?12",
        params![
            service.name,
            service.duration_minutes,
            service.price_cents,
            service.currency,
            service.buffer_before_minutes,
            service.buffer_after_minutes,
            service.min_advance_hours,
            service.max_advance_days,
            service.active as i32,
            now,
            service.id,
            service.business_id,
        ],
    )?;
    Ok(count > 0)
}

pub fn get_service(
    conn: &Connection,
    business_id: &str,
    id: &str,
) -> anyhow::Result<Option<Service>> {
    let result = conn.query_row(
        "SELECT id, business_id, name, duration_minutes, price_cents, currency,
                buffer_before_minutes, buffer_after_minutes, min_advance_hours,
                max_advance_days, active, created_at, updated_at
         FROM services WHERE id = ?1 AND business_id = ?2",
        params![id, business_id],
        parse_service_row,
    );

    match result {
        Ok(service) => Ok(Some(service)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_services(conn: &Connection, business_id: &str) -> anyhow::Result<Vec<Service>> {
    let mut stmt = conn.prepare(
        "SELECT id, business_id, name, duration_minutes, price_cents, currency,
                buffer_before_minutes, buffer_after_minutes, min_advance_hours,
                max_advance_days, active, created_at, updated_at
         FROM services WHERE business_id = ?1 ORDER BY name ASC",
    )?;

    let rows = stmt.query_map(params![business_id], parse_service_row)?;

    let mut services = vec![];
    for row in rows {
        services.push(row?);
    }
    Ok(services)
}

fn parse_service_row(row: &rusqlite::Row) -> rusqlite::Result<Service> {
    Ok(Service {
        id: row.get(0)?,
        business_id: row.get(1)?,
        name: row.get(2)?,
        duration_minutes: row.get(3)?,
        price_cents: row.get(4)?,
        currency: row.get(5)?,
        buffer_before_minutes: row.get(6)?,
        buffer_after_minutes: row.get(7)?,
        min_advance_hours: row.get(8)?,
        max_advance_days: row.get(9)?,
        active: row.get::<_, i32>(10)? != 0,
        created_at: parse_dt(&row.get::<_, String>(11)?),
        updated_at: parse_dt(&row.get::<_, String>(12)?),
    })
}

// ── Staff ──

pub fn create_staff(conn: &Connection, staff: &Staff) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO staff (id, business_id, name, working_hours, active, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            staff.id,
            staff.business_id,
            staff.name,
            staff.working_hours,
            staff.active as i32,
            fmt(&staff.created_at),
            fmt(&staff.updated_at),
        ],
    )?;
    Ok(())
}

pub fn update_staff(conn: &Connection, staff: &Staff) -> anyhow::Result<bool> {
    let now = fmt(&Utc::now().naive_utc());
    let count = conn.execute(
        "UPDATE staff SET name = ?1, working_hours = ?2, active = ?3, updated_at = ?4
         WHERE id = ?5 AND business_id = ?6",
        params![
            staff.name,
            staff.working_hours,
            staff.active as i32,
            now,
            staff.id,
            staff.business_id,
        ],
    )?;
    Ok(count > 0)
}

pub fn get_staff(conn: &Connection, business_id: &str, id: &str) -> anyhow::Result<Option<Staff>> {
    let result = conn.query_row(
        "SELECT id, business_id, name, working_hours, active, created_at, updated_at
         FROM staff WHERE id = ?1 AND business_id = ?2",
        params![id, business_id],
        parse_staff_row,
    );

    match result {
        Ok(staff) => Ok(Some(staff)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_active_staff(conn: &Connection, business_id: &str) -> anyhow::Result<Vec<Staff>> {
    let mut stmt = conn.prepare(
        "SELECT id, business_id, name, working_hours, active, created_at, updated_at
         FROM staff WHERE business_id = ?1 AND active = 1 ORDER BY name ASC",
    )?;

    let rows = stmt.query_map(params![business_id], parse_staff_row)?;

    let mut members = vec![];
    for row in rows {
        members.push(row?);
    }
    Ok(members)
}

fn parse_staff_row(row: &rusqlite::Row) -> rusqlite::Result<Staff> {
    Ok(Staff {
        id: row.get(0)?,
        business_id: row.get(1)?,
        name: row.get(2)?,
        working_hours: row.get(3)?,
        active: row.get::<_, i32>(4)? != 0,
        created_at: parse_dt(&row.get::<_, String>(5)?),
        updated_at: parse_dt(&row.get::<_, String>(6)?),
    })
}

// ── Customers ──

pub fn create_customer(conn: &Connection, customer: &Customer) -> anyhow::Result<()> {
    let tags = serde_json::to_string(&customer.tags)?;
    conn.execute(
        "INSERT INTO customers (id, business_id, name, email, phone, tags, total_bookings,
                                total_spent_cents, last_visit_at, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            customer.id,
            customer.business_id,
            customer.name,
            customer.email,
            customer.phone,
            tags,
            customer.total_bookings,
            customer.total_spent_cents,
            customer.last_visit_at.as_ref().map(fmt),
            fmt(&customer.created_at),
            fmt(&customer.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_customer(
    conn: &Connection,
    business_id: &str,
    id: &str,
) -> anyhow::Result<Option<Customer>> {
    let result = conn.query_row(
        "SELECT id, business_id, name, email, phone, tags, total_bookings, total_spent_cents,
                last_visit_at, created_at, updated_at
         FROM customers WHERE id = ?1 AND business_id = ?2",
        params![id, business_id],
        parse_customer_row,
    );

    match result {
        Ok(customer) => Ok(Some(customer)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Email lookup is scoped per business; two businesses may share a customer
/// email without colliding.
pub fn get_customer_by_email(
    conn: &Connection,
    business_id: &str,
    email: &str,
) -> anyhow::Result<Option<Customer>> {
    let result = conn.query_row(
        "SELECT id, business_id, name, email, phone, tags, total_bookings, total_spent_cents,
                last_visit_at, created_at, updated_at
         FROM customers WHERE business_id = ?1 AND email = ?2",
        params![business_id, email],
        parse_customer_row,
    );

    match result {
        Ok(customer) => Ok(Some(customer)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_customers(
    conn: &Connection,
    business_id: &str,
    limit: i64,
) -> anyhow::Result<Vec<Customer>> {
    let mut stmt = conn.prepare(
        "SELECT id, business_id, name, email, phone, tags, total_bookings, total_spent_cents,
                last_visit_at, created_at, updated_at
         FROM customers WHERE business_id = ?1 ORDER BY name ASC LIMIT ?2",
    )?;

    let rows = stmt.query_map(params![business_id, limit], parse_customer_row)?;

    let mut customers = vec![];
    for row in rows {
        customers.push(row?);
    }
    Ok(customers)
}

fn parse_customer_row(row: &rusqlite::Row) -> rusqlite::Result<Customer> {
    let tags_json: String = row.get(5)?;
    let last_visit: Option<String> = row.get(8)?;
    Ok(Customer {
        id: row.get(0)?,
        business_id: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        tags: serde_json::from_str(&tags_json).unwrap_or_default(),
        total_bookings: row.get(6)?,
        total_spent_cents: row.get(7)?,
        last_visit_at: last_visit.as_deref().map(parse_dt),
        created_at: parse_dt(&row.get::<_, String>(9)?),
        updated_at: parse_dt(&row.get::<_, String>(10)?),
    })
}

// ── Bookings ──

pub fn create_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO bookings (id, business_id, customer_id, staff_id, service_id, start_time,
                               end_time, status, price_cents, currency, buffer_before_minutes,
                               buffer_after_minutes, notes, cancel_reason, cancelled_at,
                               cancelled_by, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
        params![
            booking.id,
            booking.business_id,
            booking.customer_id,
            booking.staff_id,
            booking.service_id,
            fmt(&booking.start_time),
            fmt(&booking.end_time),
            booking.status.as_str(),
            booking.price_cents,
            booking.currency,
            booking.buffer_before_minutes,
            booking.buffer_after_minutes,
            booking.notes,
            booking.cancel_reason,
            booking.cancelled_at.as_ref().map(fmt),
            booking.cancelled_by,
            fmt(&booking.created_at),
            fmt(&booking.updated_at),
        ],
    )?;
    Ok(())
}

pub fn save_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET staff_id = ?1, start_time = ?2, end_time = ?3, status = ?4,
                notes = ?5, cancel_reason = ?6, cancelled_at = ?7, cancelled_by = ?8,
                updated_at = ?9
         WHERE id = ?10 AND business_id = ?11",
        params![
            booking.staff_id,
            fmt(&booking.start_time),
            fmt(&booking.end_time),
            booking.status.as_str(),
            booking.notes,
            booking.cancel_reason,
            booking.cancelled_at.as_ref().map(fmt),
            booking.cancelled_by,
            fmt(&booking.updated_at),
            booking.id,
            booking.business_id,
        ],
    )?;
    Ok(count > 0)
}

pub fn get_booking(
    conn: &Connection,
    business_id: &str,
    id: &str,
) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        &format!("{BOOKING_SELECT} WHERE id = ?1 AND business_id = ?2"),
        params![id, business_id],
        parse_booking_row,
    );

    match result {
        Ok(booking) => Ok(Some(booking)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Non-cancelled bookings for one staff member intersecting a time window.
/// The caller pads the window to cover buffer spill-over from neighbours.
pub fn get_staff_bookings_in_range(
    conn: &Connection,
    staff_id: &str,
    start: &NaiveDateTime,
    end: &NaiveDateTime,
) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "{BOOKING_SELECT}
         WHERE staff_id = ?1 AND status != 'cancelled'
           AND start_time < ?2 AND end_time > ?3
         ORDER BY start_time ASC"
    ))?;

    let rows = stmt.query_map(params![staff_id, fmt(end), fmt(start)], parse_booking_row)?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row?);
    }
    Ok(bookings)
}

pub fn list_bookings(
    conn: &Connection,
    business_id: &str,
    status_filter: Option<&str>,
    limit: i64,
) -> anyhow::Result<Vec<Booking>> {
    let (sql, params_vec): (String, Vec<Box<dyn rusqlite::types::ToSql>>) = match status_filter {
        Some(status) => (
            format!(
                "{BOOKING_SELECT} WHERE business_id = ?1 AND status = ?2
                 ORDER BY start_time DESC LIMIT ?3"
            ),
            vec![
                Box::new(business_id.to_string()) as Box<dyn rusqlite::types::ToSql>,
                Box::new(status.to_string()),
                Box::new(limit),
            ],
        ),
        None => (
            format!(
                "{BOOKING_SELECT} WHERE business_id = ?1
                 ORDER BY start_time DESC LIMIT ?2"
            ),
            vec![
                Box::new(business_id.to_string()) as Box<dyn rusqlite::types::ToSql>,
                Box::new(limit),
            ],
        ),
    };

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), parse_booking_row)?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row?);
    }
    Ok(bookings)
}

pub fn get_customer_bookings(
    conn: &Connection,
    customer_id: &str,
) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "{BOOKING_SELECT} WHERE customer_id = ?1 ORDER BY start_time ASC"
    ))?;

    let rows = stmt.query_map(params![customer_id], parse_booking_row)?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row?);
    }
    Ok(bookings)
}

const BOOKING_SELECT: &str = "SELECT id, business_id, customer_id, staff_id, service_id, \
     start_time, end_time, status, price_cents, currency, buffer_before_minutes, \
     buffer_after_minutes, notes, cancel_reason, cancelled_at, cancelled_by, created_at, \
     updated_at FROM bookings";

fn parse_booking_row(row: &rusqlite::Row) -> rusqlite::Result<Booking> {
    let status_str: String = row.get(7)?;
    let cancelled_at: Option<String> = row.get(14)?;
    Ok(Booking {
        id: row.get(0)?,
        business_id: row.get(1)?,
        customer_id: row.get(2)?,
        staff_id: row.get(3)?,
        service_id: row.get(4)?,
        start_time: parse_dt(&row.get::<_, String>(5)?),
        end_time: parse_dt(&row.get::<_, String>(6)?),
        status: BookingStatus::parse(&status_str),
        price_cents: row.get(8)?,
        currency: row.get(9)?,
        buffer_before_minutes: row.get(10)?,
        buffer_after_minutes: row.get(11)?,
        notes: row.get(12)?,
        cancel_reason: row.get(13)?,
        cancelled_at: cancelled_at.as_deref().map(parse_dt),
        cancelled_by: row.get(15)?,
        created_at: parse_dt(&row.get::<_, String>(16)?),
        updated_at: parse_dt(&row.get::<_, String>(17)?),
    })
}
