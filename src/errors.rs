use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::quota::QuotaError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Daily {kind} limit of {limit} reached")]
    DailyLimitReached {
        kind: String,
        limit: i64,
        count: u64,
        retry_after_secs: u64,
        upgrade_hint: Option<String>,
    },

    #[error("Not found")]
    NotFound,

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<QuotaError> for AppError {
    fn from(err: QuotaError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let retry_after = match self {
            AppError::DailyLimitReached {
                retry_after_secs, ..
            } => Some(retry_after_secs),
            _ => None,
        };

        let (status, body) = match self {
            AppError::Auth(ref msg) => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": msg, "status": 401 }),
            ),
            AppError::Validation(ref msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": msg, "status": 400 }),
            ),
            AppError::DailyLimitReached {
                ref kind,
                limit,
                count,
                ref upgrade_hint,
                ..
            } => (
                StatusCode::TOO_MANY_REQUESTS,
                json!({
                    "error": "Daily limit reached",
                    "status": 429,
                    "kind": kind,
                    "limit": limit,
                    "count": count,
                    "remaining": 0,
                    "upgrade_hint": upgrade_hint,
                }),
            ),
            AppError::NotFound => (
                StatusCode::NOT_FOUND,
                json!({ "error": "Resource not found", "status": 404 }),
            ),
            AppError::Internal(ref e) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error", "status": 500 }),
                )
            }
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
