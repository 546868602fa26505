//! Tee-time cost attribution.
//!
//! Works out what the operator paid the course for the tee-time part of a booking.
//! The cost source is chosen from an explicit priority list evaluated top-down:
//!
//! 1. `NetRate` - the matched period's absolute net rate, used as-is
//! 2. `RackKickback` - the matched period's rack rate less its kickback
//! 3. `CourseKickback` - booking revenue less the course's fallback kickback
//! 4. `DefaultMargin` - booking revenue times the default tee-time cost ratio

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use super::models::{Booking, Course, RatePeriod};

/// Share of revenue assumed to be tee-time cost when nothing better is configured.
pub const DEFAULT_TEE_TIME_COST_RATIO: Decimal = dec!(0.80);

/// Share of revenue assumed to be add-on cost when the catalog has no unit cost.
pub const DEFAULT_ADD_ON_COST_RATIO: Decimal = dec!(0.70);

/// Cost assumptions applied when contract data is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostPolicy {
    pub default_tee_time_cost_ratio: Decimal,
    pub default_add_on_cost_ratio: Decimal,
}

impl Default for CostPolicy {
    fn default() -> Self {
        Self {
            default_tee_time_cost_ratio: DEFAULT_TEE_TIME_COST_RATIO,
            default_add_on_cost_ratio: DEFAULT_ADD_ON_COST_RATIO,
        }
    }
}

/// Where a tee-time cost figure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostSource {
    NetRate(Decimal),
    RackKickback {
        rack_rate: Decimal,
        kickback_percent: Decimal,
    },
    CourseKickback {
        kickback_percent: Decimal,
    },
    DefaultMargin,
}

/// Fieldless tag of a [`CostSource`], used for tallies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CostSourceKind {
    NetRate,
    RackKickback,
    CourseKickback,
    DefaultMargin,
}

impl CostSource {
    /// Pick the first applicable tier for a matched period (if any) and its course.
    pub fn resolve(period: Option<&RatePeriod>, course: Option<&Course>) -> Self {
        let tiers = [
            period
                .and_then(|p| p.net_rate)
                .filter(|rate| *rate > Decimal::ZERO)
                .map(CostSource::NetRate),
            period.and_then(|p| match (p.rack_rate, p.kickback_percent) {
                (Some(rack_rate), Some(kickback_percent)) if rack_rate > Decimal::ZERO => {
                    Some(CostSource::RackKickback {
                        rack_rate,
                        kickback_percent,
                    })
                }
                _ => None,
            }),
            course
                .and_then(|c| c.kickback_percent)
                .filter(|percent| *percent > Decimal::ZERO)
                .map(|kickback_percent| CostSource::CourseKickback { kickback_percent }),
        ];

        tiers
            .into_iter()
            .flatten()
            .next()
            .unwrap_or(CostSource::DefaultMargin)
    }

    pub fn kind(&self) -> CostSourceKind {
        match self {
            CostSource::NetRate(_) => CostSourceKind::NetRate,
            CostSource::RackKickback { .. } => CostSourceKind::RackKickback,
            CostSource::CourseKickback { .. } => CostSourceKind::CourseKickback,
            CostSource::DefaultMargin => CostSourceKind::DefaultMargin,
        }
    }

    /// Cost of the tee-time portion. `None` only on arithmetic overflow.
    ///
    /// A net rate already covers the whole booking and is never multiplied by
    /// player count.
    pub fn cost(&self, booking_revenue: Decimal, policy: &CostPolicy) -> Option<Decimal> {
        match *self {
            CostSource::NetRate(rate) => Some(rate),
            CostSource::RackKickback {
                rack_rate,
                kickback_percent,
            } => rack_rate.checked_mul(retained_share(kickback_percent)),
            CostSource::CourseKickback { kickback_percent } => {
                booking_revenue.checked_mul(retained_share(kickback_percent))
            }
            CostSource::DefaultMargin => {
                booking_revenue.checked_mul(policy.default_tee_time_cost_ratio)
            }
        }
    }
}

/// `1 - percent / 100`
fn retained_share(percent: Decimal) -> Decimal {
    Decimal::ONE - percent / Decimal::ONE_HUNDRED
}

/// Revenue attributed to a booking's tee time.
///
/// Prefers the amount actually paid (stored in cents), then the estimated price,
/// then zero.
pub fn booking_revenue(booking: &Booking) -> Decimal {
    booking
        .total_paid_cents
        .filter(|cents| *cents > 0)
        .map(|cents| Decimal::new(cents, 2))
        .or(booking.estimated_price)
        .unwrap_or(Decimal::ZERO)
}

/// Tee-time cost together with the tier that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeeTimeCost {
    pub source: CostSource,
    pub amount: Decimal,
}

/// Attribute the tee-time cost of a booking. `None` only on arithmetic overflow.
pub fn attribute_tee_time_cost(
    booking_revenue: Decimal,
    period: Option<&RatePeriod>,
    course: Option<&Course>,
    policy: &CostPolicy,
) -> Option<TeeTimeCost> {
    let source = CostSource::resolve(period, course);
    let amount = source.cost(booking_revenue, policy)?;
    Some(TeeTimeCost { source, amount })
}
