//! Request DTOs for the profitability API.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::cost::CostPolicy;
use super::models::BookingSnapshot;
use super::report::{ReportOptions, ReportWindow};

/// Query string for a database-backed report
#[derive(Debug, Clone, Deserialize)]
pub struct ReportQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub revenue_goal: Option<Decimal>,
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
}

impl ReportQuery {
    /// Window as given; validation happens when the report is generated.
    pub fn window(&self) -> ReportWindow {
        ReportWindow {
            start: self.start,
            end: self.end,
        }
    }

    pub fn options(&self, policy: CostPolicy) -> ReportOptions {
        ReportOptions {
            policy,
            revenue_goal: self.revenue_goal,
            as_of: self.as_of,
        }
    }

    /// Canonical cache key for this query.
    pub fn cache_key(&self) -> String {
        format!(
            "report:{}:{}:{}:{}",
            self.start,
            self.end,
            self.revenue_goal
                .map(|g| g.normalize().to_string())
                .unwrap_or_default(),
            self.as_of.map(|d| d.to_string()).unwrap_or_default()
        )
    }
}

/// Request body carrying its own snapshot instead of reading the database
#[derive(Debug, Clone, Deserialize)]
pub struct ReportRequest {
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default)]
    pub revenue_goal: Option<Decimal>,
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
    pub snapshot: BookingSnapshot,
}

impl ReportRequest {
    pub fn window(&self) -> ReportWindow {
        ReportWindow {
            start: self.start,
            end: self.end,
        }
    }

    pub fn options(&self, policy: CostPolicy) -> ReportOptions {
        ReportOptions {
            policy,
            revenue_goal: self.revenue_goal,
            as_of: self.as_of,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_cache_key_is_canonical() {
        let a = ReportQuery {
            start: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 7, 31).unwrap(),
            revenue_goal: Some(dec!(5000.00)),
            as_of: None,
        };
        let b = ReportQuery {
            revenue_goal: Some(dec!(5000)),
            ..a.clone()
        };

        assert_eq!(a.cache_key(), b.cache_key());
        assert_eq!(a.cache_key(), "report:2024-07-01:2024-07-31:5000:");
    }

    #[test]
    fn test_request_body_parses_snapshot() {
        let request: ReportRequest = serde_json::from_value(serde_json::json!({
            "start": "2024-07-01",
            "end": "2024-07-31",
            "revenue_goal": "2500",
            "snapshot": {
                "courses": [{ "id": "6f1c1f4e-2a7c-4a59-9a4e-0c5d1d7b3a12", "name": "Course C" }],
                "bookings": []
            }
        }))
        .unwrap();

        assert_eq!(request.revenue_goal, Some(dec!(2500)));
        assert_eq!(request.snapshot.courses.len(), 1);
        assert!(request.snapshot.rate_periods.is_empty());
        assert_eq!(request.options(CostPolicy::default()).revenue_goal, Some(dec!(2500)));
    }
}
