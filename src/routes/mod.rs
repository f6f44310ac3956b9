// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod admin;
pub mod auth;
pub mod categories;
pub mod contact;
pub mod test_docs;
pub mod users;

use crate::error::{AppError, Result};
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::http::{header, HeaderMap, Method};
use axum::{routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HealthResponse {
    pub status: String,
    pub build_id: String,
}

/// Health check response
async fn health_check() -> Json<HealthResponse> {
    let build_id = option_env!("BUILD_ID").unwrap_or("unknown").to_string();
    Json(HealthResponse {
        status: "ok".to_string(),
        build_id,
    })
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS layer - allow requests from frontend URL and localhost (for dev)
    let frontend_url = state.config.frontend_url.clone();
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::AllowOrigin::predicate(
            move |origin: &axum::http::HeaderValue, _request_parts: &axum::http::request::Parts| {
                let origin_str = origin.to_str().unwrap_or("");
                origin_str == frontend_url
                    || origin_str.starts_with("http://localhost")
                    || origin_str.starts_with("http://127.0.0.1")
            },
        ))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    Router::new()
        .route("/health", get(health_check))
        .merge(admin::routes())
        .merge(auth::routes())
        .merge(categories::routes())
        .merge(contact::routes())
        .merge(test_docs::routes())
        .merge(users::routes())
        .layer(axum::middleware::from_fn(
            crate::middleware::security::add_security_headers,
        ))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

// ─── Shared request helpers ──────────────────────────────────

/// Unwrap a JSON body, turning extractor rejections into `BadRequest`.
pub(crate) fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

/// Token from an `Authorization: Bearer …` header, if present.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Prefer the body's `idToken`; fall back to the bearer header.
pub(crate) fn resolve_id_token<'a>(body_token: Option<&'a str>, headers: &'a HeaderMap) -> &'a str {
    body_token
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .or_else(|| bearer_token(headers))
        .unwrap_or("")
}

/// Reject IDs Firestore cannot address as a single document.
pub(crate) fn validate_document_id(kind: &str, id: &str) -> Result<()> {
    let valid = !id.is_empty()
        && id.len() <= 1500
        && id != "."
        && id != ".."
        && !id.contains('/')
        && !(id.starts_with("__") && id.ends_with("__"));

    if valid {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("Invalid {} ID", kind)))
    }
}
