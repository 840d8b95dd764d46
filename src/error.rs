// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Distance input missing, non-numeric, or not strictly positive.
    #[error("Invalid distance: {0}")]
    InvalidDistance(String),

    /// No active member name set when logging an entry.
    #[error("No member name set")]
    MissingIdentity,

    /// Import payload does not have the expected shape.
    #[error("Invalid import file: {0}")]
    MalformedImportFile(String),

    /// The storage backend failed a load, save, or subscribe call.
    #[error("Persistence unavailable: {0}")]
    PersistenceUnavailable(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl AppError {
    /// True for errors raised by input validation, before any storage call.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AppError::InvalidDistance(_)
                | AppError::MissingIdentity
                | AppError::MalformedImportFile(_)
                | AppError::BadRequest(_)
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::InvalidDistance(msg) => (
                StatusCode::BAD_REQUEST,
                "invalid_distance",
                Some(msg.clone()),
            ),
            AppError::MissingIdentity => (StatusCode::BAD_REQUEST, "missing_identity", None),
            AppError::MalformedImportFile(msg) => (
                StatusCode::BAD_REQUEST,
                "invalid_file",
                Some(msg.clone()),
            ),
            AppError::PersistenceUnavailable(msg) => {
                tracing::error!(error = %msg, "Persistence error");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "persistence_unavailable",
                    None,
                )
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
