//! Booking revenue and cost attribution engine.
//!
//! Reconstructs what the operator paid versus what the customer paid for every
//! booking in a window, then rolls the results up into margin breakdowns,
//! recommendations and alerts. The engine itself is synchronous and stateless;
//! `queries` and `routes` are the database and HTTP adapters around it.

pub mod add_ons;
pub mod aggregator;
pub mod alerts;
pub mod calculators;
pub mod cost;
pub mod goals;
pub mod models;
pub mod queries;
pub mod rate_periods;
pub mod recommendations;
pub mod report;
pub mod requests;
pub mod responses;
pub mod routes;

// Re-export commonly used items
pub use calculators::round_money;
pub use cost::CostPolicy;
pub use report::{generate_report, ProfitabilityReport, ReportError, ReportOptions, ReportWindow};
pub use routes::router;
