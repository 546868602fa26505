//! Seasonal rate period matching.
//!
//! A course can carry several rate periods covering different package types and
//! season windows. Catalog order is authoritative: the first period whose window
//! contains the booking date wins, with no secondary sort.

use chrono::{Datelike, NaiveDate};

use super::models::RatePeriod;

/// A calendar day without a year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MonthDay {
    pub month: u32,
    pub day: u32,
}

impl MonthDay {
    pub const JANUARY_FIRST: MonthDay = MonthDay { month: 1, day: 1 };

    pub fn new(month: u32, day: u32) -> Self {
        Self { month, day }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self::new(date.month(), date.day())
    }

    /// Parse "MM-DD" (a leading year, as in "YYYY-MM-DD", is ignored).
    ///
    /// Anything malformed becomes January 1st. This is a known fragility: a period
    /// with a broken start and a valid end silently covers everything from New Year
    /// up to its end. Such periods keep their place in catalog order and are not
    /// otherwise special-cased.
    pub fn parse_lenient(value: &str) -> Self {
        Self::parse(value).unwrap_or(Self::JANUARY_FIRST)
    }

    fn parse(value: &str) -> Option<Self> {
        let mut parts = value.trim().rsplit('-');
        let day = parts.next()?.trim().parse::<u32>().ok()?;
        let month = parts.next()?.trim().parse::<u32>().ok()?;
        if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return None;
        }
        Some(Self::new(month, day))
    }

    /// Integer key used for window comparison (month * 100 + day).
    pub fn ordinal(self) -> u32 {
        self.month * 100 + self.day
    }
}

/// Whether `date` lies inside the inclusive window `[start, end]`.
///
/// When `start > end` the window wraps across the year boundary.
pub fn window_contains(start: MonthDay, end: MonthDay, date: MonthDay) -> bool {
    let (start, end, value) = (start.ordinal(), end.ordinal(), date.ordinal());
    if start <= end {
        value >= start && value <= end
    } else {
        value >= start || value <= end
    }
}

fn applies_to_package(period: &RatePeriod, package_type: Option<&str>) -> bool {
    match period.package_type.as_deref().map(str::trim) {
        None | Some("") => true,
        Some(filter) => package_type
            .map(|p| p.trim().eq_ignore_ascii_case(filter))
            .unwrap_or(false),
    }
}

/// Pick the rate period that prices a booking.
///
/// Periods are first filtered by package type (a period without a filter applies to
/// every package). The first filtered period whose window contains `booking_date`
/// is returned. If none does, the first filtered period is used as a low-priority
/// fallback, or the first period overall when the filter removed everything.
/// Returns `None` only when `periods` is empty.
pub fn match_rate_period<'a>(
    periods: &[&'a RatePeriod],
    package_type: Option<&str>,
    booking_date: MonthDay,
) -> Option<&'a RatePeriod> {
    let candidates: Vec<&'a RatePeriod> = periods
        .iter()
        .copied()
        .filter(|p| applies_to_package(p, package_type))
        .collect();

    let in_window = candidates.iter().copied().find(|p| {
        window_contains(
            MonthDay::parse_lenient(&p.start_date),
            MonthDay::parse_lenient(&p.end_date),
            booking_date,
        )
    });

    if in_window.is_some() {
        return in_window;
    }

    candidates.first().or_else(|| periods.first()).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn period(package: Option<&str>, start: &str, end: &str) -> RatePeriod {
        RatePeriod {
            id: Uuid::new_v4(),
            course_id: Uuid::nil(),
            package_type: package.map(str::to_string),
            start_date: start.to_string(),
            end_date: end.to_string(),
            net_rate: Some(dec!(40)),
            rack_rate: None,
            kickback_percent: None,
        }
    }

    #[test]
    fn test_parse_month_day() {
        assert_eq!(MonthDay::parse_lenient("04-01"), MonthDay::new(4, 1));
        assert_eq!(MonthDay::parse_lenient("2024-11-30"), MonthDay::new(11, 30));
        assert_eq!(MonthDay::parse_lenient(" 3-7 "), MonthDay::new(3, 7));
    }

    #[test]
    fn test_parse_malformed_defaults_to_january_first() {
        assert_eq!(MonthDay::parse_lenient(""), MonthDay::JANUARY_FIRST);
        assert_eq!(MonthDay::parse_lenient("spring"), MonthDay::JANUARY_FIRST);
        assert_eq!(MonthDay::parse_lenient("13-01"), MonthDay::JANUARY_FIRST);
        assert_eq!(MonthDay::parse_lenient("02-45"), MonthDay::JANUARY_FIRST);
    }

    #[test]
    fn test_wrap_around_window() {
        let start = MonthDay::new(11, 1);
        let end = MonthDay::new(3, 31);
        assert!(window_contains(start, end, MonthDay::new(1, 15)));
        assert!(window_contains(start, end, MonthDay::new(12, 25)));
        assert!(window_contains(start, end, MonthDay::new(11, 1)));
        assert!(window_contains(start, end, MonthDay::new(3, 31)));
        assert!(!window_contains(start, end, MonthDay::new(6, 1)));
        assert!(!window_contains(start, end, MonthDay::new(4, 1)));
    }

    #[test]
    fn test_plain_window_is_inclusive() {
        let start = MonthDay::new(4, 1);
        let end = MonthDay::new(10, 31);
        assert!(window_contains(start, end, MonthDay::new(4, 1)));
        assert!(window_contains(start, end, MonthDay::new(10, 31)));
        assert!(!window_contains(start, end, MonthDay::new(3, 31)));
        assert!(!window_contains(start, end, MonthDay::new(11, 1)));
    }

    #[test]
    fn test_first_in_window_wins_in_catalog_order() {
        let summer = period(None, "04-01", "10-31");
        let july = period(None, "07-01", "07-31");
        let periods = vec![&summer, &july];

        let matched = match_rate_period(&periods, Some("greenfee"), MonthDay::new(7, 10)).unwrap();
        assert_eq!(matched.id, summer.id);
    }

    #[test]
    fn test_package_filter_is_case_insensitive() {
        let buggy = period(Some("greenfee+buggy"), "01-01", "12-31");
        let green = period(Some("GreenFee"), "01-01", "12-31");
        let periods = vec![&buggy, &green];

        let matched = match_rate_period(&periods, Some("greenfee"), MonthDay::new(5, 5)).unwrap();
        assert_eq!(matched.id, green.id);
    }

    #[test]
    fn test_falls_back_to_first_filtered_period() {
        let winter_other = period(Some("twilight"), "11-01", "03-31");
        let winter = period(Some("greenfee"), "11-01", "03-31");
        let periods = vec![&winter_other, &winter];

        let matched = match_rate_period(&periods, Some("greenfee"), MonthDay::new(6, 1)).unwrap();
        assert_eq!(matched.id, winter.id);
    }

    #[test]
    fn test_falls_back_to_unfiltered_list_when_filter_removes_everything() {
        let twilight = period(Some("twilight"), "11-01", "03-31");
        let periods = vec![&twilight];

        let matched = match_rate_period(&periods, Some("greenfee"), MonthDay::new(6, 1)).unwrap();
        assert_eq!(matched.id, twilight.id);
    }

    #[test]
    fn test_missing_package_type_only_matches_unfiltered_periods() {
        let filtered = period(Some("greenfee"), "01-01", "12-31");
        let open = period(None, "01-01", "12-31");
        let periods = vec![&filtered, &open];

        let matched = match_rate_period(&periods, None, MonthDay::new(8, 8)).unwrap();
        assert_eq!(matched.id, open.id);
    }

    #[test]
    fn test_no_periods_is_no_match() {
        assert!(match_rate_period(&[], Some("greenfee"), MonthDay::new(1, 1)).is_none());
    }

    #[test]
    fn test_matching_is_deterministic() {
        let a = period(Some("greenfee"), "11-01", "03-31");
        let b = period(None, "04-01", "10-31");
        let c = period(None, "oops", "05-31");
        let periods = vec![&a, &b, &c];

        let first = match_rate_period(&periods, Some("greenfee"), MonthDay::new(2, 14)).map(|p| p.id);
        for _ in 0..10 {
            let again =
                match_rate_period(&periods, Some("greenfee"), MonthDay::new(2, 14)).map(|p| p.id);
            assert_eq!(first, again);
        }
        assert_eq!(first, Some(a.id));
    }

    #[test]
    fn test_malformed_start_keeps_catalog_position() {
        // Broken start parses as Jan 1, so the period covers Jan 1 - May 31, but an
        // earlier period that contains the date still wins.
        let broken = period(None, "oops", "05-31");
        let spring = period(None, "03-01", "05-31");
        let periods = vec![&spring, &broken];

        let matched = match_rate_period(&periods, None, MonthDay::new(4, 15)).unwrap();
        assert_eq!(matched.id, spring.id);

        let matched = match_rate_period(&periods, None, MonthDay::new(1, 20)).unwrap();
        assert_eq!(matched.id, broken.id);
    }
}
