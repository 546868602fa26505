//! Response DTOs for the profitability API.
//!
//! This is the only place money is rounded: every amount is rounded to two decimal
//! places with banker's rounding and serialized as a decimal string.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::aggregator::{
    CostSourceTally, CourseStats, LossReason, LossTransaction, MarginBand, ProductTypeStats,
};
use super::alerts::Alert;
use super::calculators::round_money;
use super::goals::GoalProgress;
use super::recommendations::Recommendations;
use super::report::ProfitabilityReport;

fn money(amount: Decimal) -> Decimal {
    round_money(amount, 2)
}

#[derive(Debug, Clone, Serialize)]
pub struct PeriodResponse {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryResponse {
    #[serde(with = "rust_decimal::serde::str")]
    pub total_revenue: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_cost: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_profit: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub profit_margin_percent: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub tee_time_revenue: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub add_on_revenue: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub average_profit_per_booking: Decimal,
    pub total_bookings: usize,
    pub loss_making_bookings: usize,
    pub skipped_cancelled: usize,
    pub overflow_dropped: usize,
    pub outside_window: usize,
    pub cost_sources: CostSourceTally,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductTypeResponse {
    pub product_type: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub revenue: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub cost: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub profit: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub margin_percent: Decimal,
    pub transactions: usize,
    pub band: MarginBand,
    pub recommendation: String,
}

impl From<&ProductTypeStats> for ProductTypeResponse {
    fn from(stats: &ProductTypeStats) -> Self {
        Self {
            product_type: stats.product_type.clone(),
            revenue: money(stats.revenue),
            cost: money(stats.cost),
            profit: money(stats.profit),
            margin_percent: money(stats.margin_percent),
            transactions: stats.transactions,
            band: stats.band,
            recommendation: stats.band.recommendation().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseResponse {
    pub course_id: Uuid,
    pub course_name: String,
    pub region: Option<String>,
    #[serde(with = "rust_decimal::serde::str")]
    pub revenue: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub cost: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub profit: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub margin_percent: Decimal,
    pub bookings: usize,
    #[serde(with = "rust_decimal::serde::str")]
    pub average_profit_per_booking: Decimal,
}

impl From<&CourseStats> for CourseResponse {
    fn from(stats: &CourseStats) -> Self {
        Self {
            course_id: stats.course_id,
            course_name: stats.course_name.clone(),
            region: stats.region.clone(),
            revenue: money(stats.revenue),
            cost: money(stats.cost),
            profit: money(stats.profit),
            margin_percent: money(stats.margin_percent),
            bookings: stats.bookings,
            average_profit_per_booking: money(stats.average_profit_per_booking),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LossTransactionResponse {
    pub booking_id: Uuid,
    pub course_id: Uuid,
    pub course_name: String,
    pub tee_time: Option<NaiveDateTime>,
    #[serde(with = "rust_decimal::serde::str")]
    pub revenue: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub cost: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub loss: Decimal,
    pub reason: LossReason,
}

impl From<&LossTransaction> for LossTransactionResponse {
    fn from(loss: &LossTransaction) -> Self {
        Self {
            booking_id: loss.booking_id,
            course_id: loss.course_id,
            course_name: loss.course_name.clone(),
            tee_time: loss.tee_time,
            revenue: money(loss.revenue),
            cost: money(loss.cost),
            loss: money(loss.loss),
            reason: loss.reason,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GoalProgressResponse {
    #[serde(with = "rust_decimal::serde::str")]
    pub goal: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub achieved: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub progress_percent: Decimal,
    pub as_of: NaiveDate,
    pub days_elapsed: i64,
    pub days_total: i64,
    #[serde(with = "rust_decimal::serde::str")]
    pub projected_revenue: Decimal,
    pub on_track: bool,
}

impl From<&GoalProgress> for GoalProgressResponse {
    fn from(progress: &GoalProgress) -> Self {
        Self {
            goal: money(progress.goal),
            achieved: money(progress.achieved),
            progress_percent: money(progress.progress_percent),
            as_of: progress.as_of,
            days_elapsed: progress.days_elapsed,
            days_total: progress.days_total,
            projected_revenue: money(progress.projected_revenue),
            on_track: progress.on_track,
        }
    }
}

/// Full report as returned to API clients.
#[derive(Debug, Clone, Serialize)]
pub struct ProfitabilityReportResponse {
    pub period: PeriodResponse,
    pub summary: SummaryResponse,
    pub by_product_type: Vec<ProductTypeResponse>,
    pub by_course: Vec<CourseResponse>,
    pub loss_making_transactions: Vec<LossTransactionResponse>,
    pub recommendations: Recommendations,
    pub alerts: Vec<Alert>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal_progress: Option<GoalProgressResponse>,
}

impl From<&ProfitabilityReport> for ProfitabilityReportResponse {
    fn from(report: &ProfitabilityReport) -> Self {
        let aggregates = &report.aggregates;
        let summary = &aggregates.summary;

        Self {
            period: PeriodResponse {
                start: report.window.start,
                end: report.window.end,
            },
            summary: SummaryResponse {
                total_revenue: money(summary.total_revenue),
                total_cost: money(summary.total_cost),
                total_profit: money(summary.total_profit),
                profit_margin_percent: money(summary.margin_percent),
                tee_time_revenue: money(summary.tee_time_revenue),
                add_on_revenue: money(summary.add_on_revenue),
                average_profit_per_booking: money(summary.average_profit_per_booking),
                total_bookings: summary.booking_count,
                loss_making_bookings: summary.loss_count,
                skipped_cancelled: report.skipped_cancelled,
                overflow_dropped: summary.overflow_dropped,
                outside_window: report.outside_window,
                cost_sources: summary.cost_sources,
            },
            by_product_type: aggregates.by_product_type.iter().map(Into::into).collect(),
            by_course: aggregates.by_course.iter().map(Into::into).collect(),
            loss_making_transactions: aggregates
                .loss_transactions
                .iter()
                .map(Into::into)
                .collect(),
            recommendations: report.recommendations.clone(),
            alerts: report.alerts.clone(),
            goal_progress: report.goal_progress.as_ref().map(Into::into),
        }
    }
}

/// Generic error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}
