//! Report generation entry point.
//!
//! Validates the request, groups contract data by course once, prices every booking,
//! then folds the records into breakdowns, recommendations and alerts. Stateless:
//! identical inputs always produce an identical report.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, info};
use uuid::Uuid;

use super::aggregator::{self, Aggregates};
use super::alerts::{generate_alerts, Alert};
use super::calculators::{calculate_booking, BookingProfitability, CourseContext};
use super::cost::CostPolicy;
use super::goals::{goal_progress, GoalProgress};
use super::models::{BookingSnapshot, BookingStatus, Course};
use super::recommendations::{recommend, Recommendations};

/// Caller misuse that rejects a report request outright.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReportError {
    #[error("invalid report window: end {end} is before start {start}")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },

    #[error("booking {booking_id} is missing required field '{field}'")]
    MissingField {
        booking_id: Uuid,
        field: &'static str,
    },

    #[error("revenue goal must be positive, got {0}")]
    InvalidGoal(Decimal),
}

/// Inclusive date range a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ReportWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ReportError> {
        let window = Self { start, end };
        window.validate()?;
        Ok(window)
    }

    pub fn validate(&self) -> Result<(), ReportError> {
        if self.end < self.start {
            return Err(ReportError::InvalidWindow {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of calendar days covered, both ends included.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// Optional knobs for a report.
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    pub policy: CostPolicy,
    pub revenue_goal: Option<Decimal>,
    /// Date the goal projection is measured at; defaults to the window end.
    pub as_of: Option<NaiveDate>,
}

/// Everything computed for one window. Values are unrounded.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfitabilityReport {
    pub window: ReportWindow,
    pub aggregates: Aggregates,
    pub recommendations: Recommendations,
    pub alerts: Vec<Alert>,
    pub goal_progress: Option<GoalProgress>,
    pub skipped_cancelled: usize,
    /// Priced bookings whose tee time falls outside the window.
    pub outside_window: usize,
}

fn validate_snapshot(snapshot: &BookingSnapshot) -> Result<(), ReportError> {
    for booking in snapshot
        .bookings
        .iter()
        .filter(|b| b.status != BookingStatus::Cancelled)
    {
        if booking.course_id.is_none() {
            return Err(ReportError::MissingField {
                booking_id: booking.id,
                field: "course_id",
            });
        }
        if booking.tee_time.is_none() {
            return Err(ReportError::MissingField {
                booking_id: booking.id,
                field: "tee_time",
            });
        }
    }
    Ok(())
}

/// Group courses, rate periods and add-on catalogs by course id, keeping catalog
/// order within each course.
fn course_contexts(snapshot: &BookingSnapshot) -> HashMap<Uuid, CourseContext<'_>> {
    let mut contexts: HashMap<Uuid, CourseContext<'_>> = HashMap::new();

    for course in &snapshot.courses {
        contexts.entry(course.id).or_default().course = Some(course);
    }
    for period in &snapshot.rate_periods {
        contexts
            .entry(period.course_id)
            .or_default()
            .rate_periods
            .push(period);
    }
    for entry in &snapshot.add_ons {
        contexts
            .entry(entry.course_id)
            .or_default()
            .catalog
            .insert(entry.id, entry);
    }

    contexts
}

/// Price every non-cancelled booking in the snapshot, in input order.
pub fn calculate_all(snapshot: &BookingSnapshot, policy: &CostPolicy) -> Vec<BookingProfitability> {
    let contexts = course_contexts(snapshot);
    let empty = CourseContext::default();

    snapshot
        .bookings
        .iter()
        .filter(|b| b.status != BookingStatus::Cancelled)
        .map(|booking| {
            let context = booking
                .course_id
                .and_then(|id| contexts.get(&id))
                .unwrap_or(&empty);
            calculate_booking(booking, context, policy)
        })
        .collect()
}

/// Build the full profitability report for `window`.
///
/// The snapshot is expected to hold the window's bookings; cancelled bookings are
/// skipped. The window is not enforced on the snapshot: bookings outside it are
/// still priced and counted, and reported in `outside_window`. Rejects an inverted window, a non-positive goal, and bookings missing a
/// course or tee time.
pub fn generate_report(
    window: ReportWindow,
    snapshot: &BookingSnapshot,
    options: &ReportOptions,
) -> Result<ProfitabilityReport, ReportError> {
    window.validate()?;
    if let Some(goal) = options.revenue_goal {
        if goal <= Decimal::ZERO {
            return Err(ReportError::InvalidGoal(goal));
        }
    }
    validate_snapshot(snapshot)?;

    let skipped_cancelled = snapshot
        .bookings
        .iter()
        .filter(|b| b.status == BookingStatus::Cancelled)
        .count();
    if skipped_cancelled > 0 {
        debug!(skipped_cancelled, "Skipping cancelled bookings");
    }

    let outside_window = snapshot
        .bookings
        .iter()
        .filter(|b| b.status != BookingStatus::Cancelled)
        .filter(|b| b.tee_time.is_some_and(|t| !window.contains(t.date())))
        .count();
    if outside_window > 0 {
        debug!(outside_window, "Snapshot holds bookings outside the report window");
    }

    let records = calculate_all(snapshot, &options.policy);

    let courses: HashMap<Uuid, &Course> = snapshot.courses.iter().map(|c| (c.id, c)).collect();
    let aggregates = aggregator::aggregate(&records, &courses);
    let recommendations = recommend(&aggregates.by_product_type, &aggregates.by_course);
    let alerts = generate_alerts(&aggregates);

    let goal_progress = options.revenue_goal.map(|goal| {
        goal_progress(
            goal,
            aggregates.summary.total_revenue,
            &window,
            options.as_of.unwrap_or(window.end),
        )
    });

    info!(
        start = %window.start,
        end = %window.end,
        bookings = aggregates.summary.booking_count,
        losses = aggregates.summary.loss_count,
        alerts = alerts.len(),
        "Generated profitability report"
    );

    Ok(ProfitabilityReport {
        window,
        aggregates,
        recommendations,
        alerts,
        goal_progress,
        skipped_cancelled,
        outside_window,
    })
}
