//! Tee-time booking profitability service.
//!
//! Attributes revenue and operator cost to every booking, aggregates margins by
//! product type and course, and serves the resulting report over HTTP.

pub mod cache;
pub mod config;
pub mod error;
pub mod profitability;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use sqlx::PgPool;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::cache::ReportCache;
use crate::config::Config;
use crate::error::AppError;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub cache: ReportCache,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            cache: ReportCache::new(config.report_cache_capacity, config.report_cache_ttl),
            config: Arc::new(config),
        }
    }
}

/// Build the application router
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(profitability::router())
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn not_found() -> AppError {
    AppError::NotFound
}
