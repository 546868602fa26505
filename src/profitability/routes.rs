//! Profitability API route handlers

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

use crate::cache::CacheStats;
use crate::error::Result;
use crate::AppState;

use super::queries;
use super::report::generate_report;
use super::requests::{ReportQuery, ReportRequest};
use super::responses::ProfitabilityReportResponse;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/profitability/report", get(report).post(report_from_snapshot))
        .route("/api/profitability/cache/invalidate", post(invalidate_cache))
}

/// Report over bookings stored in the database
pub async fn report(
    State(state): State<AppState>,
    query: std::result::Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Json<ProfitabilityReportResponse>> {
    let Query(query) = query?;
    let key = query.cache_key();
    if let Some(cached) = state.cache.get(&key).await {
        tracing::debug!("Cache HIT for report: {}", key);
        return Ok(Json((*cached).clone()));
    }
    tracing::debug!("Cache MISS for report: {}", key);

    let window = query.window();
    window.validate()?;
    let snapshot = queries::load_snapshot(&state.db, &window).await?;
    let report = generate_report(window, &snapshot, &query.options(state.config.cost_policy))?;

    let response = ProfitabilityReportResponse::from(&report);
    state.cache.insert(key, Arc::new(response.clone())).await;
    Ok(Json(response))
}

/// Report over a snapshot supplied in the request body; never cached
pub async fn report_from_snapshot(
    State(state): State<AppState>,
    request: std::result::Result<Json<ReportRequest>, JsonRejection>,
) -> Result<Json<ProfitabilityReportResponse>> {
    let Json(request) = request?;
    let report = generate_report(
        request.window(),
        &request.snapshot,
        &request.options(state.config.cost_policy),
    )?;
    Ok(Json(ProfitabilityReportResponse::from(&report)))
}

/// Drop every cached report, e.g. after rate periods change
pub async fn invalidate_cache(State(state): State<AppState>) -> Json<CacheStats> {
    state.cache.invalidate_all();
    Json(state.cache.stats())
}
