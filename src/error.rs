//! Error handling for the application

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::profitability::report::ReportError;
use crate::profitability::responses::ErrorResponse;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid report request: {0}")]
    Report(#[from] ReportError),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Report(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            AppError::NotFound => "not_found",
            AppError::Database(_) => "database_error",
            AppError::Report(ReportError::InvalidWindow { .. }) => "invalid_window",
            AppError::Report(ReportError::MissingField { .. }) => "missing_field",
            AppError::Report(ReportError::InvalidGoal(_)) => "invalid_goal",
            AppError::BadRequest(_) => "bad_request",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                "Database error".to_string()
            }
            other => {
                tracing::debug!("Rejected request: {}", other);
                other.to_string()
            }
        };

        let details = match &self {
            AppError::Report(ReportError::MissingField { booking_id, field }) => {
                Some(serde_json::json!({ "booking_id": booking_id, "field": field }))
            }
            AppError::Report(ReportError::InvalidWindow { start, end }) => {
                Some(serde_json::json!({ "start": start, "end": end }))
            }
            _ => None,
        };

        let body = ErrorResponse {
            error_type: self.error_type().to_string(),
            message,
            details,
        };

        (self.status(), Json(body)).into_response()
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
