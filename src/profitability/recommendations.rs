//! Qualitative guidance derived from the breakdowns.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use super::aggregator::{CourseStats, ProductTypeStats};
use super::calculators::round_money;

pub const FOCUS_MIN_MARGIN: Decimal = dec!(20);
pub const FOCUS_MIN_TRANSACTIONS: usize = 5;
pub const REDUCE_FOCUS_MAX_MARGIN: Decimal = dec!(5);
pub const PRICE_ADJUSTMENT_MAX_MARGIN: Decimal = dec!(10);
pub const TOP_COURSE_MIN_AVG_PROFIT: Decimal = dec!(20);
pub const TOP_COURSES: usize = 3;
pub const RENEGOTIATE_MAX_MARGIN: Decimal = dec!(10);
pub const RENEGOTIATE_MIN_BOOKINGS: usize = 3;

pub const MAX_FOCUS_AREAS: usize = 5;
pub const MAX_REDUCE_FOCUS: usize = 5;
pub const MAX_PRICE_ADJUSTMENTS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentScope {
    ProductType,
    Course,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceAdjustment {
    pub scope: AdjustmentScope,
    pub target: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub margin_percent: Decimal,
    pub suggestion: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Recommendations {
    pub focus_areas: Vec<String>,
    pub reduce_focus: Vec<String>,
    pub price_adjustments: Vec<PriceAdjustment>,
}

fn percent(value: Decimal) -> Decimal {
    round_money(value, 1)
}

fn product_price_suggestion(margin: Decimal) -> &'static str {
    if margin < Decimal::ZERO {
        "Increase prices 15-20%"
    } else {
        "Consider a 5-10% price increase"
    }
}

/// Build recommendations from product-type and course breakdowns.
pub fn recommend(products: &[ProductTypeStats], courses: &[CourseStats]) -> Recommendations {
    let mut result = Recommendations::default();

    let mut by_margin: Vec<&ProductTypeStats> = products.iter().collect();
    by_margin.sort_by(|a, b| b.margin_percent.cmp(&a.margin_percent));

    for product in by_margin {
        let margin = product.margin_percent;

        if margin >= FOCUS_MIN_MARGIN && product.transactions >= FOCUS_MIN_TRANSACTIONS {
            result.focus_areas.push(format!(
                "{}: {}% margin across {} transactions",
                product.product_type,
                percent(margin),
                product.transactions
            ));
        }

        if margin < REDUCE_FOCUS_MAX_MARGIN {
            result.reduce_focus.push(format!(
                "{}: {}% margin",
                product.product_type,
                percent(margin)
            ));
        }

        if margin < PRICE_ADJUSTMENT_MAX_MARGIN {
            result.price_adjustments.push(PriceAdjustment {
                scope: AdjustmentScope::ProductType,
                target: product.product_type.clone(),
                margin_percent: percent(margin),
                suggestion: product_price_suggestion(margin).to_string(),
            });
        }
    }

    let mut by_avg_profit: Vec<&CourseStats> = courses
        .iter()
        .filter(|c| c.average_profit_per_booking > TOP_COURSE_MIN_AVG_PROFIT)
        .collect();
    by_avg_profit.sort_by(|a, b| b.average_profit_per_booking.cmp(&a.average_profit_per_booking));

    for course in by_avg_profit.into_iter().take(TOP_COURSES) {
        result.focus_areas.push(format!(
            "{}: €{} average profit per booking",
            course.course_name,
            round_money(course.average_profit_per_booking, 2)
        ));
    }

    for course in courses {
        if course.margin_percent < RENEGOTIATE_MAX_MARGIN && course.bookings >= RENEGOTIATE_MIN_BOOKINGS {
            result.price_adjustments.push(PriceAdjustment {
                scope: AdjustmentScope::Course,
                target: course.course_name.clone(),
                margin_percent: percent(course.margin_percent),
                suggestion: "Renegotiate rates with the course".to_string(),
            });
        }
    }

    result.focus_areas.truncate(MAX_FOCUS_AREAS);
    result.reduce_focus.truncate(MAX_REDUCE_FOCUS);
    result.price_adjustments.truncate(MAX_PRICE_ADJUSTMENTS);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    use crate::profitability::aggregator::MarginBand;

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

    fn course(name: &str, margin: Decimal, bookings: usize, avg_profit: Decimal) -> CourseStats {
        CourseStats {
            course_id: Uuid::new_v4(),
            course_name: name.to_string(),
            region: None,
            revenue: dec!(1000),
            cost: dec!(1000) - margin * dec!(10),
            profit: margin * dec!(10),
            margin_percent: margin,
            bookings,
            average_profit_per_booking: avg_profit,
        }
    }

    #[test]
    fn test_focus_requires_margin_and_volume() {
        let products = vec![
            product("buggy", dec!(35), 12),
            product("clubs", dec!(40), 4),
            product("tee_time", dec!(20), 5),
        ];

        let recs = recommend(&products, &[]);
        assert_eq!(recs.focus_areas.len(), 2);
        assert!(recs.focus_areas[0].starts_with("buggy"));
        assert!(recs.focus_areas[1].starts_with("tee_time"));
        assert!(recs.reduce_focus.is_empty());
        assert!(recs.price_adjustments.is_empty());
    }

    #[test]
    fn test_low_margin_products_get_price_adjustments() {
        let products = vec![
            product("trolley", dec!(8), 3),
            product("other", dec!(3), 2),
            product("clubs", dec!(-12), 6),
        ];

        let recs = recommend(&products, &[]);
        assert_eq!(recs.reduce_focus.len(), 2);
        assert!(recs.reduce_focus[0].starts_with("other"));
        assert!(recs.reduce_focus[1].starts_with("clubs"));

        let targets: Vec<&str> = recs.price_adjustments.iter().map(|p| p.target.as_str()).collect();
        assert_eq!(targets, vec!["trolley", "other", "clubs"]);
        assert_eq!(recs.price_adjustments[0].suggestion, "Consider a 5-10% price increase");
        assert_eq!(recs.price_adjustments[2].suggestion, "Increase prices 15-20%");
    }

    #[test]
    fn test_top_courses_by_average_profit() {
        let courses = vec![
            course("A", dec!(30), 10, dec!(22)),
            course("B", dec!(30), 10, dec!(45)),
            course("C", dec!(30), 10, dec!(20)),
            course("D", dec!(30), 10, dec!(31)),
            course("E", dec!(30), 10, dec!(25)),
        ];

        let recs = recommend(&[], &courses);
        assert_eq!(recs.focus_areas.len(), 3);
        assert!(recs.focus_areas[0].starts_with("B:"));
        assert!(recs.focus_areas[1].starts_with("D:"));
        assert!(recs.focus_areas[2].starts_with("E:"));
    }

    #[test]
    fn test_low_margin_courses_renegotiate() {
        let courses = vec![
            course("Busy", dec!(6), 8, dec!(3)),
            course("Quiet", dec!(4), 2, dec!(2)),
        ];

        let recs = recommend(&[], &courses);
        assert_eq!(recs.price_adjustments.len(), 1);
        assert_eq!(recs.price_adjustments[0].scope, AdjustmentScope::Course);
        assert_eq!(recs.price_adjustments[0].target, "Busy");
    }

    #[test]
    fn test_lists_are_capped() {
        let products: Vec<ProductTypeStats> = (0..8)
            .map(|i| product(&format!("p{i}"), dec!(-1) - Decimal::from(i), 1))
            .collect();
        let courses: Vec<CourseStats> = (0..8)
            .map(|i| course(&format!("c{i}"), dec!(1), 5, dec!(1)))
            .collect();

        let recs = recommend(&products, &courses);
        assert_eq!(recs.reduce_focus.len(), MAX_REDUCE_FOCUS);
        assert_eq!(recs.price_adjustments.len(), MAX_PRICE_ADJUSTMENTS);

        let rich: Vec<ProductTypeStats> = (0..8)
            .map(|i| product(&format!("r{i}"), dec!(50), 10))
            .collect();
        assert_eq!(recommend(&rich, &[]).focus_areas.len(), MAX_FOCUS_AREAS);
    }
}
