use chrono::{Datelike, Duration, NaiveDate};
use rusqlite::{params, Connection};
use serde::Serialize;

use crate::models::TIME_FMT;

/// Rewrites a customer's derived aggregates from a fold over their bookings.
/// The stored columns are a cache of this fold and nothing else ever writes
/// them; called after every ledger mutation touching the customer.
pub fn recompute_customer(conn: &Connection, customer_id: &str) -> anyhow::Result<()> {
    let now = chrono::Utc::now().naive_utc().format(TIME_FMT).to_string();
    conn.execute(
        "UPDATE customers SET
            total_bookings = (
                SELECT COUNT(*) FROM bookings
                WHERE customer_id = ?1 AND status != 'cancelled'
            ),
            total_spent_cents = (
                SELECT COALESCE(SUM(price_cents), 0) FROM bookings
                WHERE customer_id = ?1 AND status IN ('confirmed', 'completed')
            ),
            last_visit_at = (
                SELECT MAX(start_time) FROM bookings
                WHERE customer_id = ?1 AND status != 'cancelled'
            ),
            updated_at = ?2
         WHERE id = ?1",
        params![customer_id, now],
    )?;
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub today_bookings: i64,
    pub week_bookings: i64,
    pub month_bookings: i64,
    pub total_revenue_cents: i64,
    pub average_booking_value_cents: i64,
    pub popular_services: Vec<ServiceRank>,
}

#[derive(Debug, Serialize)]
pub struct ServiceRank {
    pub service_id: String,
    pub name: String,
    pub bookings: i64,
    pub revenue_cents: i64,
}

/// Business-wide dashboard aggregates, computed on demand from the ledger.
/// `today` is the current date in the business's civil time; the week window
/// starts on Sunday, matching the weekday-0 convention.
pub fn dashboard_stats(
    conn: &Connection,
    business_id: &str,
    today: NaiveDate,
) -> anyhow::Result<DashboardStats> {
    let day_start = today.and_hms_opt(0, 0, 0).expect("valid midnight");
    let week_start = day_start - Duration::days(today.weekday().num_days_from_sunday() as i64);
    let month_start = today
        .with_day(1)
        .expect("first of month")
        .and_hms_opt(0, 0, 0)
        .expect("valid midnight");
    let next_month = if today.month() == 12 {
        NaiveDate::from_ymd_opt(today.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(today.year(), today.month() + 1, 1)
    }
    .expect("first of next month")
    .and_hms_opt(0, 0, 0)
    .expect("valid midnight");

    let count_window = |from: &chrono::NaiveDateTime, to: &chrono::NaiveDateTime| -> anyhow::Result<i64> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM bookings
             WHERE business_id = ?1 AND status != 'cancelled'
               AND start_time >= ?2 AND start_time < ?3",
            params![
                business_id,
                from.format(TIME_FMT).to_string(),
                to.format(TIME_FMT).to_string()
            ],
            |row| row.get(0),
        )?;
        Ok(count)
    };

    let today_bookings = count_window(&day_start, &(day_start + Duration::days(1)))?;
    let week_bookings = count_window(&week_start, &(week_start + Duration::days(7)))?;
    let month_bookings = count_window(&month_start, &next_month)?;

    let (total_revenue_cents, completed_count): (i64, i64) = conn.query_row(
        "SELECT COALESCE(SUM(price_cents), 0), COUNT(*) FROM bookings
         WHERE business_id = ?1 AND status = 'completed'",
        params![business_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    let average_booking_value_cents = if completed_count > 0 {
        total_revenue_cents / completed_count
    } else {
        0
    };

    let mut stmt = conn.prepare(
        "SELECT b.service_id, s.name, COUNT(*) AS cnt, COALESCE(SUM(b.price_cents), 0)
         FROM bookings b
         JOIN services s ON s.id = b.service_id
         WHERE b.business_id = ?1 AND b.status != 'cancelled'
         GROUP BY b.service_id
         ORDER BY cnt DESC
         LIMIT 4",
    )?;
    let rows = stmt.query_map(params![business_id], |row| {
        Ok(ServiceRank {
            service_id: row.get(0)?,
            name: row.get(1)?,
            bookings: row.get(2)?,
            revenue_cents: row.get(3)?,
        })
    })?;

    let mut popular_services = vec![];
    for row in rows {
        popular_services.push(row?);
    }

    Ok(DashboardStats {
        today_bookings,
        week_bookings,
        month_bookings,
        total_revenue_cents,
        average_booking_value_cents,
        popular_services,
    })
}
