//! Database queries for profitability reporting.
//!
//! Everything a report needs is loaded up front in one pass; the engine does its own
//! grouping by course, so no per-booking queries are issued.

use sqlx::PgPool;
use tracing::debug;

use crate::error::AppError;

use super::models::{AddOnCatalogEntry, Booking, BookingRow, BookingSnapshot, Course, RatePeriod};
use super::report::ReportWindow;

/// Bookings whose tee time falls inside the window. Cancelled rows are included so
/// the report can count what it skipped.
pub async fn find_bookings_in_window(
    pool: &PgPool,
    window: &ReportWindow,
) -> Result<Vec<Booking>, AppError> {
    let rows = sqlx::query_as::<_, BookingRow>(
        r#"
        SELECT
            id, course_id, tee_time, players,
            total_paid_cents, estimated_price, package_type, add_ons,
            status, created_at, utm_source, utm_medium, utm_campaign
        FROM golf_booking
        WHERE tee_time::date >= $1
          AND tee_time::date <= $2
        ORDER BY tee_time, id
        "#,
    )
    .bind(window.start)
    .bind(window.end)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Booking::from).collect())
}

/// All courses
pub async fn find_courses(pool: &PgPool) -> Result<Vec<Course>, AppError> {
    let courses = sqlx::query_as::<_, Course>(
        r#"
        SELECT id, name, region, kickback_percent
        FROM golf_course
        ORDER BY name, id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(courses)
}

/// All rate periods, in catalog order within each course
pub async fn find_rate_periods(pool: &PgPool) -> Result<Vec<RatePeriod>, AppError> {
    let periods = sqlx::query_as::<_, RatePeriod>(
        r#"
        SELECT
            id, course_id, package_type, start_date, end_date,
            net_rate, rack_rate, kickback_percent
        FROM golf_rate_period
        ORDER BY course_id, sort_order, id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(periods)
}

/// All add-on catalog entries
pub async fn find_add_on_catalog(pool: &PgPool) -> Result<Vec<AddOnCatalogEntry>, AppError> {
    let entries = sqlx::query_as::<_, AddOnCatalogEntry>(
        r#"
        SELECT id, course_id, name, addon_type, price, cost, per_player
        FROM golf_addon
        ORDER BY course_id, name, id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(entries)
}

/// Load everything a report over `window` needs.
pub async fn load_snapshot(pool: &PgPool, window: &ReportWindow) -> Result<BookingSnapshot, AppError> {
    let (bookings, courses, rate_periods, add_ons) = tokio::try_join!(
        find_bookings_in_window(pool, window),
        find_courses(pool),
        find_rate_periods(pool),
        find_add_on_catalog(pool),
    )?;

    debug!(
        bookings = bookings.len(),
        courses = courses.len(),
        rate_periods = rate_periods.len(),
        add_ons = add_ons.len(),
        "Loaded profitability snapshot"
    );

    Ok(BookingSnapshot {
        bookings,
        courses,
        rate_periods,
        add_ons,
    })
}
