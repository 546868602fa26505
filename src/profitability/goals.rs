//! Revenue goal progress with straight-line extrapolation.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::calculators::percent_of;
use super::report::ReportWindow;

/// Progress towards a revenue goal for the report window. Values are unrounded.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalProgress {
    pub goal: Decimal,
    pub achieved: Decimal,
    pub progress_percent: Decimal,
    pub as_of: NaiveDate,
    pub days_elapsed: i64,
    pub days_total: i64,
    pub projected_revenue: Decimal,
    pub on_track: bool,
}

/// Compare revenue achieved so far with `goal`.
///
/// `as_of` is clamped into the window; the projection assumes the daily rate seen so
/// far holds for the rest of the window.
pub fn goal_progress(
    goal: Decimal,
    achieved: Decimal,
    window: &ReportWindow,
    as_of: NaiveDate,
) -> GoalProgress {
    let as_of = as_of.clamp(window.start, window.end);
    let days_total = window.days();
    let days_elapsed = (as_of - window.start).num_days() + 1;

    let projected_revenue = achieved
        .checked_mul(Decimal::from(days_total))
        .and_then(|scaled| scaled.checked_div(Decimal::from(days_elapsed)))
        .unwrap_or(achieved);

    GoalProgress {
        goal,
        achieved,
        progress_percent: percent_of(achieved, goal),
        as_of,
        days_elapsed,
        days_total,
        projected_revenue,
        on_track: projected_revenue >= goal,
    }
}
