//! Per-booking profitability and shared money helpers.
//!
//! Pure functions - no database access. A booking that cannot be priced degrades to a
//! zeroed record so one bad historical row never aborts a report.

use chrono::NaiveDateTime;
use rust_decimal::prelude::*;
use tracing::{debug, warn};
use uuid::Uuid;

use super::add_ons::{self, AddOnBreakdownItem, CatalogIndex};
use super::cost::{self, CostPolicy, CostSourceKind};
use super::models::{Booking, Course, RatePeriod};
use super::rate_periods::{match_rate_period, MonthDay};

/// Round to specified decimal places using banker's rounding (ROUND_HALF_EVEN).
///
/// Banker's rounding rounds to the nearest even number when the value is exactly
/// halfway between two possibilities. This reduces cumulative rounding bias.
///
/// # Examples
/// ```
/// use rust_decimal_macros::dec;
/// use teetime_analytics::profitability::round_money;
///
/// assert_eq!(round_money(dec!(2.5), 0), dec!(2));   // rounds to even
/// assert_eq!(round_money(dec!(3.5), 0), dec!(4));   // rounds to even
/// assert_eq!(round_money(dec!(1.234), 2), dec!(1.23));
/// ```
pub fn round_money(amount: Decimal, places: u32) -> Decimal {
    amount.round_dp_with_strategy(places, RoundingStrategy::MidpointNearestEven)
}

/// `part / whole * 100`, or zero when `whole` is zero.
pub fn percent_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    part.checked_div(whole)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::ZERO)
}

/// `profit / revenue * 100`, or zero when there is no revenue.
pub fn margin_percent(profit: Decimal, revenue: Decimal) -> Decimal {
    percent_of(profit, revenue)
}

/// Contract data for one course, grouped once before the per-booking loop.
#[derive(Debug, Clone, Default)]
pub struct CourseContext<'a> {
    pub course: Option<&'a Course>,
    /// Rate periods in catalog order.
    pub rate_periods: Vec<&'a RatePeriod>,
    pub catalog: CatalogIndex<'a>,
}

/// Revenue and cost for one booking. Values are unrounded.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingProfitability {
    pub booking_id: Uuid,
    pub course_id: Uuid,
    pub tee_time: Option<NaiveDateTime>,
    pub players: i32,
    pub tee_time_revenue: Decimal,
    pub tee_time_cost: Decimal,
    pub cost_source: CostSourceKind,
    pub add_on_revenue: Decimal,
    pub add_on_cost: Decimal,
    pub add_on_breakdown: Vec<AddOnBreakdownItem>,
    pub total_revenue: Decimal,
    pub total_cost: Decimal,
    pub profit: Decimal,
}

impl BookingProfitability {
    /// Record contributing nothing, used when a booking cannot be priced.
    pub fn zeroed(booking: &Booking) -> Self {
        Self {
            booking_id: booking.id,
            course_id: booking.course_id.unwrap_or_default(),
            tee_time: booking.tee_time,
            players: booking.players,
            tee_time_revenue: Decimal::ZERO,
            tee_time_cost: Decimal::ZERO,
            cost_source: CostSourceKind::DefaultMargin,
            add_on_revenue: Decimal::ZERO,
            add_on_cost: Decimal::ZERO,
            add_on_breakdown: Vec::new(),
            total_revenue: Decimal::ZERO,
            total_cost: Decimal::ZERO,
            profit: Decimal::ZERO,
        }
    }

    pub fn is_loss(&self) -> bool {
        self.profit < Decimal::ZERO
    }
}

/// Why a booking could not be priced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalculationError {
    #[error("booking {0} has no tee time")]
    MissingTeeTime(Uuid),

    #[error("booking {0} has no course")]
    MissingCourse(Uuid),

    #[error("arithmetic overflow pricing booking {0}")]
    Overflow(Uuid),
}

/// Price one booking, propagating failures.
pub fn try_calculate_booking(
    booking: &Booking,
    context: &CourseContext<'_>,
    policy: &CostPolicy,
) -> Result<BookingProfitability, CalculationError> {
    let tee_time = booking
        .tee_time
        .ok_or(CalculationError::MissingTeeTime(booking.id))?;
    let course_id = booking
        .course_id
        .ok_or(CalculationError::MissingCourse(booking.id))?;

    let revenue = cost::booking_revenue(booking);
    let period = match_rate_period(
        &context.rate_periods,
        booking.package_type.as_deref(),
        MonthDay::from_date(tee_time.date()),
    );
    let tee_time_cost = cost::attribute_tee_time_cost(revenue, period, context.course, policy)
        .ok_or(CalculationError::Overflow(booking.id))?;

    debug!(
        booking_id = %booking.id,
        rate_period = ?period.map(|p| p.id),
        cost_source = ?tee_time_cost.source.kind(),
        "Attributed tee-time cost"
    );

    let add_ons = add_ons::decompose(booking, &context.catalog, policy);

    let total_revenue = revenue
        .checked_add(add_ons.revenue)
        .ok_or(CalculationError::Overflow(booking.id))?;
    let total_cost = tee_time_cost
        .amount
        .checked_add(add_ons.cost)
        .ok_or(CalculationError::Overflow(booking.id))?;
    let profit = total_revenue
        .checked_sub(total_cost)
        .ok_or(CalculationError::Overflow(booking.id))?;

    Ok(BookingProfitability {
        booking_id: booking.id,
        course_id,
        tee_time: Some(tee_time),
        players: booking.players,
        tee_time_revenue: revenue,
        tee_time_cost: tee_time_cost.amount,
        cost_source: tee_time_cost.source.kind(),
        add_on_revenue: add_ons.revenue,
        add_on_cost: add_ons.cost,
        add_on_breakdown: add_ons.breakdown,
        total_revenue,
        total_cost,
        profit,
    })
}

/// Price one booking. Never fails: errors degrade to a zeroed record.
pub fn calculate_booking(
    booking: &Booking,
    context: &CourseContext<'_>,
    policy: &CostPolicy,
) -> BookingProfitability {
    try_calculate_booking(booking, context, policy).unwrap_or_else(|e| {
        warn!(booking_id = %booking.id, error = %e, "Booking priced as zero");
        BookingProfitability::zeroed(booking)
    })
}
