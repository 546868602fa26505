//! In-memory caching using moka
//!
//! Reports are pure functions of a database snapshot, so a short TTL is enough to
//! absorb dashboard refreshes without serving stale pricing data for long.

use moka::future::Cache;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::profitability::responses::ProfitabilityReportResponse;

/// Cache of rendered profitability reports (query key -> report)
#[derive(Clone)]
pub struct ReportCache {
    pub reports: Cache<String, Arc<ProfitabilityReportResponse>>,
}

impl ReportCache {
    /// Create a cache holding at most `capacity` reports for `ttl` each
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        Self {
            reports: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub async fn get(&self, key: &str) -> Option<Arc<ProfitabilityReportResponse>> {
        self.reports.get(key).await
    }

    pub async fn insert(&self, key: String, report: Arc<ProfitabilityReportResponse>) {
        self.reports.insert(key, report).await;
    }

    /// Get cache statistics for monitoring
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            reports_size: self.reports.entry_count(),
        }
    }

    /// Invalidate all cached reports
    pub fn invalidate_all(&self) {
        self.reports.invalidate_all();
        info!("Report cache invalidated");
    }
}

impl Default for ReportCache {
    fn default() -> Self {
        Self::new(64, Duration::from_secs(5 * 60))
    }
}

/// Cache statistics for monitoring endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub reports_size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::profitability::models::BookingSnapshot;
    use crate::profitability::report::{generate_report, ReportOptions, ReportWindow};

    fn empty_report() -> Arc<ProfitabilityReportResponse> {
        let window = ReportWindow::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        )
        .unwrap();
        let report =
            generate_report(window, &BookingSnapshot::default(), &ReportOptions::default()).unwrap();
        Arc::new(ProfitabilityReportResponse::from(&report))
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let cache = ReportCache::default();
        assert!(cache.get("report:a").await.is_none());

        cache.insert("report:a".to_string(), empty_report()).await;
        let cached = cache.get("report:a").await.unwrap();
        assert_eq!(cached.summary.total_bookings, 0);
    }

    #[tokio::test]
    async fn test_invalidate_all() {
        let cache = ReportCache::default();
        cache.insert("report:a".to_string(), empty_report()).await;

        cache.invalidate_all();
        assert!(cache.get("report:a").await.is_none());
    }
}
