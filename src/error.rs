// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Message returned while the server-side Firebase clients are absent.
pub const CLIENT_SDK_FALLBACK: &str =
    "Server-side Firebase is not configured; use the client SDK instead";

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid or expired token: {0}")]
    InvalidToken(String),

    #[error("Permission denied: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Identity provider error: {0}")]
    IdentityProvider(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Error for a server-side client that was never configured.
    pub fn not_configured() -> Self {
        AppError::Unavailable(CLIENT_SDK_FALLBACK.to_string())
    }

    /// HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::IdentityProvider(_) | AppError::Database(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (error, details) = match &self {
            AppError::InvalidToken(msg) => {
                tracing::debug!(reason = %msg, "Rejected identity token");
                ("invalid_token", Some(msg.clone()))
            }
            AppError::Forbidden(msg) => ("forbidden", Some(msg.clone())),
            AppError::NotFound(msg) => ("not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => ("bad_request", Some(msg.clone())),
            AppError::Unavailable(msg) => {
                tracing::warn!(reason = %msg, "Server-side client unavailable");
                ("unavailable", Some(msg.clone()))
            }
            AppError::IdentityProvider(msg) => {
                tracing::error!(error = %msg, "Identity provider error");
                ("identity_provider_error", Some(msg.clone()))
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                ("database_error", Some(msg.clone()))
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                ("internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (self.status(), Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
