//! Input records for profitability reporting.
//!
//! These are owned by the booking platform's database; the engine only reads them.
//! Rows that map one-to-one onto a table derive sqlx's FromRow for direct
//! deserialization, and every record also deserializes from JSON so a caller can
//! post a snapshot without going through the database.

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Booking lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    /// Parse the database representation. Unknown values are treated as pending.
    pub fn from_db(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "CONFIRMED" => BookingStatus::Confirmed,
            "CANCELLED" | "CANCELED" => BookingStatus::Cancelled,
            _ => BookingStatus::Pending,
        }
    }
}

/// A tee-time reservation.
#[derive(Debug, Clone, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    #[serde(default)]
    pub course_id: Option<Uuid>,
    #[serde(default)]
    pub tee_time: Option<NaiveDateTime>,
    #[serde(default = "default_players")]
    pub players: i32,
    /// Amount actually charged, in the smallest currency unit.
    #[serde(default)]
    pub total_paid_cents: Option<i64>,
    #[serde(default)]
    pub estimated_price: Option<Decimal>,
    #[serde(default)]
    pub package_type: Option<String>,
    /// Serialized add-on selection list, as stored on the booking.
    #[serde(default)]
    pub add_ons: Option<String>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub utm_source: Option<String>,
    #[serde(default)]
    pub utm_medium: Option<String>,
    #[serde(default)]
    pub utm_campaign: Option<String>,
}

fn default_players() -> i32 {
    1
}

/// Booking row from golf_booking
#[derive(Debug, Clone, FromRow)]
pub struct BookingRow {
    pub id: Uuid,
    pub course_id: Option<Uuid>,
    pub tee_time: Option<NaiveDateTime>,
    pub players: i32,
    pub total_paid_cents: Option<i64>,
    pub estimated_price: Option<Decimal>,
    pub package_type: Option<String>,
    pub add_ons: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
}

impl From<BookingRow> for Booking {
    fn from(row: BookingRow) -> Self {
        Self {
            id: row.id,
            course_id: row.course_id,
            tee_time: row.tee_time,
            players: row.players,
            total_paid_cents: row.total_paid_cents,
            estimated_price: row.estimated_price,
            package_type: row.package_type,
            add_ons: row.add_ons,
            status: BookingStatus::from_db(&row.status),
            created_at: row.created_at,
            utm_source: row.utm_source,
            utm_medium: row.utm_medium,
            utm_campaign: row.utm_campaign,
        }
    }
}

/// Course from golf_course
#[derive(Debug, Clone, FromRow, Deserialize)]
pub struct Course {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub region: Option<String>,
    /// Kickback percentage (0-100) applied when no rate period prices a booking.
    #[serde(default)]
    pub kickback_percent: Option<Decimal>,
}

/// Seasonal contract rate from golf_rate_period.
///
/// `start_date` and `end_date` are month-day strings ("MM-DD") without a year, so a
/// window may wrap across New Year.
#[derive(Debug, Clone, FromRow, Deserialize)]
pub struct RatePeriod {
    pub id: Uuid,
    pub course_id: Uuid,
    #[serde(default)]
    pub package_type: Option<String>,
    pub start_date: String,
    pub end_date: String,
    /// Absolute cost for the whole booking (not per player).
    #[serde(default)]
    pub net_rate: Option<Decimal>,
    #[serde(default)]
    pub rack_rate: Option<Decimal>,
    #[serde(default)]
    pub kickback_percent: Option<Decimal>,
}

/// Add-on catalog entry from golf_addon
#[derive(Debug, Clone, FromRow, Deserialize)]
pub struct AddOnCatalogEntry {
    pub id: Uuid,
    pub course_id: Uuid,
    #[serde(default)]
    pub name: String,
    pub addon_type: String,
    pub price: Decimal,
    #[serde(default)]
    pub cost: Option<Decimal>,
    #[serde(default)]
    pub per_player: bool,
}

/// Everything the engine needs for one report, fetched once up front.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingSnapshot {
    #[serde(default)]
    pub bookings: Vec<Booking>,
    #[serde(default)]
    pub courses: Vec<Course>,
    #[serde(default)]
    pub rate_periods: Vec<RatePeriod>,
    #[serde(default)]
    pub add_ons: Vec<AddOnCatalogEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_db() {
        assert_eq!(BookingStatus::from_db("CONFIRMED"), BookingStatus::Confirmed);
        assert_eq!(BookingStatus::from_db("cancelled"), BookingStatus::Cancelled);
        assert_eq!(BookingStatus::from_db("PENDING"), BookingStatus::Pending);
        assert_eq!(BookingStatus::from_db("weird"), BookingStatus::Pending);
    }

    #[test]
    fn test_booking_deserializes_with_defaults() {
        let booking: Booking = serde_json::from_value(serde_json::json!({
            "id": "6f1c1f4e-2a7c-4a59-9a4e-0c5d1d7b3a10",
            "status": "CONFIRMED",
            "created_at": "2024-07-01T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(booking.players, 1);
        assert!(booking.course_id.is_none());
        assert!(booking.tee_time.is_none());
        assert!(booking.add_ons.is_none());
    }

    #[test]
    fn test_decimal_fields_accept_numbers_and_strings() {
        let period: RatePeriod = serde_json::from_value(serde_json::json!({
            "id": "6f1c1f4e-2a7c-4a59-9a4e-0c5d1d7b3a11",
            "course_id": "6f1c1f4e-2a7c-4a59-9a4e-0c5d1d7b3a12",
            "start_date": "04-01",
            "end_date": "10-31",
            "net_rate": 40,
            "rack_rate": "55.50"
        }))
        .unwrap();

        assert_eq!(period.net_rate, Some(Decimal::from(40)));
        assert_eq!(period.rack_rate, Some(Decimal::new(5550, 2)));
        assert!(period.package_type.is_none());
    }
}
