//! Threshold alerts over the aggregated figures.
//!
//! Each check is evaluated independently; alerts only describe, they never act.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use super::aggregator::Aggregates;
use super::calculators::round_money;

pub const MARGIN_WARNING_PERCENT: Decimal = dec!(10);
pub const MARGIN_CRITICAL_PERCENT: Decimal = dec!(5);
pub const LOSS_RATIO_WARNING_PERCENT: Decimal = dec!(5);
pub const LOSS_RATIO_CRITICAL_PERCENT: Decimal = dec!(10);
/// Product types need this many transactions before a negative margin raises an alert.
pub const NEGATIVE_PRODUCT_MIN_TRANSACTIONS: usize = 3;
pub const LARGE_LOSS_THRESHOLD: Decimal = dec!(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    LowMargin,
    LossRatio,
    NegativeProductMargin,
    LargeLosses,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub severity: AlertSeverity,
    pub kind: AlertKind,
    pub message: String,
    /// Observed value (a percentage, or a count for large losses).
    #[serde(with = "rust_decimal::serde::str")]
    pub value: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub threshold: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

fn margin_alert(aggregates: &Aggregates) -> Option<Alert> {
    let summary = &aggregates.summary;
    if summary.booking_count == 0 {
        return None;
    }

    let margin = summary.margin_percent;
    let (severity, threshold) = if margin < MARGIN_CRITICAL_PERCENT {
        (AlertSeverity::Critical, MARGIN_CRITICAL_PERCENT)
    } else if margin < MARGIN_WARNING_PERCENT {
        (AlertSeverity::Warning, MARGIN_WARNING_PERCENT)
    } else {
        return None;
    };

    Some(Alert {
        severity,
        kind: AlertKind::LowMargin,
        message: format!(
            "Overall margin is {}%, below the {}% threshold",
            round_money(margin, 2),
            threshold
        ),
        value: round_money(margin, 2),
        threshold,
        subject: None,
    })
}

fn loss_ratio_alert(aggregates: &Aggregates) -> Option<Alert> {
    let summary = &aggregates.summary;
    if summary.booking_count == 0 {
        return None;
    }

    let ratio = summary.loss_ratio_percent();
    let (severity, threshold) = if ratio > LOSS_RATIO_CRITICAL_PERCENT {
        (AlertSeverity::Critical, LOSS_RATIO_CRITICAL_PERCENT)
    } else if ratio > LOSS_RATIO_WARNING_PERCENT {
        (AlertSeverity::Warning, LOSS_RATIO_WARNING_PERCENT)
    } else {
        return None;
    };

    Some(Alert {
        severity,
        kind: AlertKind::LossRatio,
        message: format!(
            "{} of {} bookings lost money ({}%)",
            summary.loss_count,
            summary.booking_count,
            round_money(ratio, 2)
        ),
        value: round_money(ratio, 2),
        threshold,
        subject: None,
    })
}

fn negative_product_alerts(aggregates: &Aggregates) -> impl Iterator<Item = Alert> + '_ {
    aggregates
        .by_product_type
        .iter()
        .filter(|p| {
            p.margin_percent < Decimal::ZERO && p.transactions >= NEGATIVE_PRODUCT_MIN_TRANSACTIONS
        })
        .map(|p| Alert {
            severity: AlertSeverity::Critical,
            kind: AlertKind::NegativeProductMargin,
            message: format!(
                "{} is losing money: {}% margin over {} transactions",
                p.product_type,
                round_money(p.margin_percent, 2),
                p.transactions
            ),
            value: round_money(p.margin_percent, 2),
            threshold: Decimal::ZERO,
            subject: Some(p.product_type.clone()),
        })
}

fn large_loss_alert(aggregates: &Aggregates) -> Option<Alert> {
    let count = aggregates
        .loss_transactions
        .iter()
        .filter(|t| t.loss > LARGE_LOSS_THRESHOLD)
        .count();
    if count == 0 {
        return None;
    }

    Some(Alert {
        severity: AlertSeverity::Warning,
        kind: AlertKind::LargeLosses,
        message: format!(
            "{} booking(s) lost more than €{} each",
            count, LARGE_LOSS_THRESHOLD
        ),
        value: Decimal::from(count),
        threshold: LARGE_LOSS_THRESHOLD,
        subject: None,
    })
}

/// Evaluate every threshold against the aggregates.
pub fn generate_alerts(aggregates: &Aggregates) -> Vec<Alert> {
    let mut alerts = Vec::new();
    alerts.extend(margin_alert(aggregates));
    alerts.extend(loss_ratio_alert(aggregates));
    alerts.extend(negative_product_alerts(aggregates));
    alerts.extend(large_loss_alert(aggregates));
    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    use crate::profitability::aggregator::{
        LossReason, LossTransaction, MarginBand, ProductTypeStats, Summary,
    };

    fn summary(margin: Decimal, bookings: usize, losses: usize) -> Summary {
        Summary {
            margin_percent: margin,
            booking_count: bookings,
            loss_count: losses,
            ..Summary::default()
        }
    }

    fn loss(amount: Decimal) -> LossTransaction {
        LossTransaction {
            booking_id: Uuid::new_v4(),
            course_id: Uuid::nil(),
            course_name: "Test".to_string(),
            tee_time: None,
            revenue: dec!(10),
            cost: dec!(10) + amount,
            loss: amount,
            reason: LossReason::TeeTimeBelowCost,
        }
    }

    fn product(name: &str, margin: Decimal, transactions: usize) -> ProductTypeStats {
        ProductTypeStats {
            product_type: name.to_string(),
            revenue: dec!(100),
            cost: dec!(100) - margin,
            profit: margin,
            margin_percent: margin,
            transactions,
            band: MarginBand::from_margin(margin),
        }
    }

    #[test]
    fn test_healthy_report_has_no_alerts() {
        let aggregates = Aggregates {
            summary: summary(dec!(30), 100, 2),
            ..Aggregates::default()
        };
        assert!(generate_alerts(&aggregates).is_empty());
    }

    #[test]
    fn test_empty_report_has_no_alerts() {
        assert!(generate_alerts(&Aggregates::default()).is_empty());
    }

    #[test]
    fn test_margin_thresholds() {
        let warning = generate_alerts(&Aggregates {
            summary: summary(dec!(7.5), 100, 0),
            ..Aggregates::default()
        });
        assert_eq!(warning.len(), 1);
        assert_eq!(warning[0].kind, AlertKind::LowMargin);
        assert_eq!(warning[0].severity, AlertSeverity::Warning);

        let critical = generate_alerts(&Aggregates {
            summary: summary(dec!(4.99), 100, 0),
            ..Aggregates::default()
        });
        assert_eq!(critical.len(), 1);
        assert_eq!(critical[0].severity, AlertSeverity::Critical);
    }

    #[test]
    fn test_loss_ratio_thresholds() {
        let at_limit = generate_alerts(&Aggregates {
            summary: summary(dec!(30), 100, 5),
            ..Aggregates::default()
        });
        assert!(at_limit.is_empty());

        let warning = generate_alerts(&Aggregates {
            summary: summary(dec!(30), 100, 6),
            ..Aggregates::default()
        });
        assert_eq!(warning[0].kind, AlertKind::LossRatio);
        assert_eq!(warning[0].severity, AlertSeverity::Warning);

        let critical = generate_alerts(&Aggregates {
            summary: summary(dec!(30), 100, 11),
            ..Aggregates::default()
        });
        assert_eq!(critical[0].severity, AlertSeverity::Critical);
    }

    #[test]
    fn test_negative_products_need_enough_transactions() {
        let alerts = generate_alerts(&Aggregates {
            summary: summary(dec!(30), 100, 0),
            by_product_type: vec![
                product("clubs", dec!(-5), 3),
                product("trolley", dec!(-50), 2),
                product("buggy", dec!(12), 20),
            ],
            ..Aggregates::default()
        });

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::NegativeProductMargin);
        assert_eq!(alerts[0].severity, AlertSeverity::Critical);
        assert_eq!(alerts[0].subject.as_deref(), Some("clubs"));
    }

    #[test]
    fn test_large_losses_aggregate_into_one_alert() {
        let alerts = generate_alerts(&Aggregates {
            summary: summary(dec!(30), 1000, 3),
            loss_transactions: vec![loss(dec!(80)), loss(dec!(50.01)), loss(dec!(50))],
            ..Aggregates::default()
        });

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::LargeLosses);
        assert_eq!(alerts[0].value, dec!(2));
    }

    #[test]
    fn test_checks_do_not_short_circuit() {
        let alerts = generate_alerts(&Aggregates {
            summary: summary(dec!(-3), 10, 4),
            by_product_type: vec![product("tee_time", dec!(-3), 10)],
            loss_transactions: vec![loss(dec!(75))],
            ..Aggregates::default()
        });

        let kinds: Vec<AlertKind> = alerts.iter().map(|a| a.kind).collect();
        assert_eq!(
            kinds,
            vec![
                AlertKind::LowMargin,
                AlertKind::LossRatio,
                AlertKind::NegativeProductMargin,
                AlertKind::LargeLosses
            ]
        );
    }
}
