//! Folds per-booking records into report breakdowns.
//!
//! Accumulation is unrounded; rounding happens when response DTOs are built.
//! Every list handed out is explicitly sorted (stable sorts, so ties keep input
//! order) and never depends on hash-map iteration order.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use super::add_ons::{BUGGY, CLUBS, OTHER, TROLLEY};
use super::calculators::{margin_percent, BookingProfitability};
use super::cost::CostSourceKind;
use super::models::Course;

/// Bucket for the tee-time portion of every booking.
pub const TEE_TIME: &str = "tee_time";

/// Buckets that always exist before any add-on types are discovered.
pub const INITIAL_PRODUCT_TYPES: [&str; 5] = [TEE_TIME, BUGGY, CLUBS, TROLLEY, OTHER];

pub const UNKNOWN_COURSE: &str = "Unknown course";

/// Margin band of a product type and the guidance attached to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarginBand {
    High,
    Healthy,
    Thin,
    Marginal,
    Negative,
}

impl MarginBand {
    pub fn from_margin(margin_percent: Decimal) -> Self {
        if margin_percent >= dec!(25) {
            MarginBand::High
        } else if margin_percent >= dec!(15) {
            MarginBand::Healthy
        } else if margin_percent >= dec!(5) {
            MarginBand::Thin
        } else if margin_percent >= Decimal::ZERO {
            MarginBand::Marginal
        } else {
            MarginBand::Negative
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            MarginBand::High => "High performer - maintain and expand",
            MarginBand::Healthy => "Healthy margin - continue",
            MarginBand::Thin => "Thin margin - optimize costs",
            MarginBand::Marginal => "Marginal - review pricing",
            MarginBand::Negative => "Loss-making - urgent review",
        }
    }
}

/// Why a booking lost money, checked in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LossReason {
    #[serde(rename = "tee time sold below cost")]
    TeeTimeBelowCost,
    #[serde(rename = "add-ons sold below cost")]
    AddOnsBelowCost,
    #[serde(rename = "combined revenue below total costs")]
    CombinedShortfall,
}

impl LossReason {
    pub fn classify(record: &BookingProfitability) -> Self {
        if record.tee_time_cost > record.tee_time_revenue {
            LossReason::TeeTimeBelowCost
        } else if record.add_on_cost > record.add_on_revenue {
            LossReason::AddOnsBelowCost
        } else {
            LossReason::CombinedShortfall
        }
    }
}

/// How many bookings each cost tier priced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CostSourceTally {
    pub net_rate: usize,
    pub rack_kickback: usize,
    pub course_kickback: usize,
    pub default_margin: usize,
}

impl CostSourceTally {
    fn record(&mut self, kind: CostSourceKind) {
        match kind {
            CostSourceKind::NetRate => self.net_rate += 1,
            CostSourceKind::RackKickback => self.rack_kickback += 1,
            CostSourceKind::CourseKickback => self.course_kickback += 1,
            CostSourceKind::DefaultMargin => self.default_margin += 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    pub total_revenue: Decimal,
    pub total_cost: Decimal,
    pub total_profit: Decimal,
    pub tee_time_revenue: Decimal,
    pub add_on_revenue: Decimal,
    pub margin_percent: Decimal,
    pub average_profit_per_booking: Decimal,
    pub booking_count: usize,
    pub loss_count: usize,
    /// Bookings left out because adding them would overflow the report totals.
    pub overflow_dropped: usize,
    pub cost_sources: CostSourceTally,
}

impl Summary {
    /// Share of bookings that lost money, in percent.
    pub fn loss_ratio_percent(&self) -> Decimal {
        if self.booking_count == 0 {
            return Decimal::ZERO;
        }
        Decimal::from(self.loss_count) / Decimal::from(self.booking_count) * Decimal::ONE_HUNDRED
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductTypeStats {
    pub product_type: String,
    pub revenue: Decimal,
    pub cost: Decimal,
    pub profit: Decimal,
    pub margin_percent: Decimal,
    pub transactions: usize,
    pub band: MarginBand,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CourseStats {
    pub course_id: Uuid,
    pub course_name: String,
    pub region: Option<String>,
    pub revenue: Decimal,
    pub cost: Decimal,
    pub profit: Decimal,
    pub margin_percent: Decimal,
    pub bookings: usize,
    pub average_profit_per_booking: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LossTransaction {
    pub booking_id: Uuid,
    pub course_id: Uuid,
    pub course_name: String,
    pub tee_time: Option<NaiveDateTime>,
    pub revenue: Decimal,
    pub cost: Decimal,
    /// Positive amount lost.
    pub loss: Decimal,
    pub reason: LossReason,
}

/// All breakdowns for one report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregates {
    pub summary: Summary,
    pub by_product_type: Vec<ProductTypeStats>,
    pub by_course: Vec<CourseStats>,
    pub loss_transactions: Vec<LossTransaction>,
}

#[derive(Debug, Default)]
struct Totals {
    revenue: Decimal,
    cost: Decimal,
    count: usize,
}

impl Totals {
    /// Returns `None`, leaving the totals unchanged, when a sum would overflow.
    fn add(&mut self, revenue: Decimal, cost: Decimal) -> Option<()> {
        let next_revenue = self.revenue.checked_add(revenue)?;
        let next_cost = self.cost.checked_add(cost)?;
        self.revenue = next_revenue;
        self.cost = next_cost;
        self.count += 1;
        Some(())
    }

    fn profit(&self) -> Decimal {
        self.revenue.saturating_sub(self.cost)
    }
}

fn average(total: Decimal, count: usize) -> Decimal {
    if count == 0 {
        Decimal::ZERO
    } else {
        total / Decimal::from(count)
    }
}

fn accumulate(summary: &Summary, record: &BookingProfitability) -> Option<Summary> {
    let mut next = summary.clone();
    next.total_revenue = summary.total_revenue.checked_add(record.total_revenue)?;
    next.total_cost = summary.total_cost.checked_add(record.total_cost)?;
    next.tee_time_revenue = summary.tee_time_revenue.checked_add(record.tee_time_revenue)?;
    next.add_on_revenue = summary.add_on_revenue.checked_add(record.add_on_revenue)?;
    next.total_profit = next.total_revenue.checked_sub(next.total_cost)?;
    next.booking_count += 1;
    if record.is_loss() {
        next.loss_count += 1;
    }
    next.cost_sources.record(record.cost_source);
    Some(next)
}

/// Summarize `records`, dropping any booking whose amounts would overflow the
/// running totals. Returns the records that made it into the summary.
fn summarize(records: &[BookingProfitability]) -> (Summary, Cow<'_, [BookingProfitability]>) {
    let mut summary = Summary::default();
    let mut dropped = Vec::new();

    for (index, record) in records.iter().enumerate() {
        match accumulate(&summary, record) {
            Some(next) => summary = next,
            None => {
                warn!(booking_id = %record.booking_id, "Report totals overflowed; dropping booking");
                dropped.push(index);
            }
        }
    }

    summary.overflow_dropped = dropped.len();
    summary.margin_percent = margin_percent(summary.total_profit, summary.total_revenue);
    summary.average_profit_per_booking = average(summary.total_profit, summary.booking_count);

    let kept = if dropped.is_empty() {
        Cow::Borrowed(records)
    } else {
        Cow::Owned(
            records
                .iter()
                .enumerate()
                .filter(|(index, _)| !dropped.contains(index))
                .map(|(_, record)| record.clone())
                .collect(),
        )
    };
    (summary, kept)
}

fn add_to_bucket(totals: &mut Totals, bucket: &str, revenue: Decimal, cost: Decimal) {
    if totals.add(revenue, cost).is_none() {
        warn!(bucket, "Breakdown totals overflowed; amount left out");
    }
}

/// Revenue, cost and margin per product type, best profit first.
pub fn by_product_type(records: &[BookingProfitability]) -> Vec<ProductTypeStats> {
    let mut buckets: Vec<(String, Totals)> = INITIAL_PRODUCT_TYPES
        .iter()
        .map(|t| (t.to_string(), Totals::default()))
        .collect();

    fn bucket<'b>(buckets: &'b mut Vec<(String, Totals)>, product_type: &str) -> &'b mut Totals {
        let index = match buckets.iter().position(|(t, _)| t == product_type) {
            Some(index) => index,
            None => {
                buckets.push((product_type.to_string(), Totals::default()));
                buckets.len() - 1
            }
        };
        &mut buckets[index].1
    }

    for record in records {
        add_to_bucket(
            bucket(&mut buckets, TEE_TIME),
            TEE_TIME,
            record.tee_time_revenue,
            record.tee_time_cost,
        );
        for item in &record.add_on_breakdown {
            add_to_bucket(
                bucket(&mut buckets, &item.addon_type),
                &item.addon_type,
                item.revenue,
                item.cost,
            );
        }
    }

    let mut stats: Vec<ProductTypeStats> = buckets
        .into_iter()
        .filter(|(_, totals)| !(totals.count == 0 && totals.revenue.is_zero()))
        .map(|(product_type, totals)| {
            let profit = totals.profit();
            let margin = margin_percent(profit, totals.revenue);
            ProductTypeStats {
                product_type,
                revenue: totals.revenue,
                cost: totals.cost,
                profit,
                margin_percent: margin,
                transactions: totals.count,
                band: MarginBand::from_margin(margin),
            }
        })
        .collect();

    stats.sort_by(|a, b| b.profit.cmp(&a.profit));
    stats
}

fn course_name(courses: &HashMap<Uuid, &Course>, course_id: Uuid) -> String {
    courses
        .get(&course_id)
        .map(|c| c.name.clone())
        .unwrap_or_else(|| UNKNOWN_COURSE.to_string())
}

/// Revenue, cost and margin per course, best profit first.
pub fn by_course(
    records: &[BookingProfitability],
    courses: &HashMap<Uuid, &Course>,
) -> Vec<CourseStats> {
    let mut grouped: BTreeMap<Uuid, Totals> = BTreeMap::new();
    for record in records {
        let totals = grouped.entry(record.course_id).or_default();
        add_to_bucket(totals, "course", record.total_revenue, record.total_cost);
    }

    let mut stats: Vec<CourseStats> = grouped
        .into_iter()
        .map(|(course_id, totals)| {
            let profit = totals.profit();
            CourseStats {
                course_id,
                course_name: course_name(courses, course_id),
                region: courses.get(&course_id).and_then(|c| c.region.clone()),
                revenue: totals.revenue,
                cost: totals.cost,
                profit,
                margin_percent: margin_percent(profit, totals.revenue),
                bookings: totals.count,
                average_profit_per_booking: average(profit, totals.count),
            }
        })
        .collect();

    stats.sort_by(|a, b| b.profit.cmp(&a.profit));
    stats
}

/// Every booking that lost money, largest loss first.
pub fn loss_transactions(
    records: &[BookingProfitability],
    courses: &HashMap<Uuid, &Course>,
) -> Vec<LossTransaction> {
    let mut losses: Vec<LossTransaction> = records
        .iter()
        .filter(|r| r.is_loss())
        .map(|r| LossTransaction {
            booking_id: r.booking_id,
            course_id: r.course_id,
            course_name: course_name(courses, r.course_id),
            tee_time: r.tee_time,
            revenue: r.total_revenue,
            cost: r.total_cost,
            loss: -r.profit,
            reason: LossReason::classify(r),
        })
        .collect();

    losses.sort_by(|a, b| b.loss.cmp(&a.loss));
    losses
}

/// Fold booking records into every breakdown.
///
/// A booking that would overflow the report totals is left out of every breakdown
/// and counted in `summary.overflow_dropped`.
pub fn aggregate(
    records: &[BookingProfitability],
    courses: &HashMap<Uuid, &Course>,
) -> Aggregates {
    let (summary, kept) = summarize(records);
    Aggregates {
        summary,
        by_product_type: by_product_type(&kept),
        by_course: by_course(&kept, courses),
        loss_transactions: loss_transactions(&kept, courses),
    }
}
