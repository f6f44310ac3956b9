// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Administrator check route.

use crate::error::Result;
use crate::routes::{json_body, resolve_id_token};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/admin/check", post(check_admin))
}

#[derive(Deserialize)]
pub struct AdminCheckRequest {
    #[serde(rename = "idToken", default)]
    id_token: Option<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct AdminCheckResponse {
    pub is_admin: bool,
    pub uid: String,
    pub email: String,
}

/// Confirm that the caller's ID token belongs to an administrator.
async fn check_admin(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: std::result::Result<Json<AdminCheckRequest>, JsonRejection>,
) -> Result<Json<AdminCheckResponse>> {
    let request = json_body(payload)?;
    let token = resolve_id_token(request.id_token.as_deref(), &headers);

    let principal = state.admin_guard.authorize(token).await?;

    Ok(Json(AdminCheckResponse {
        is_admin: true,
        uid: principal.uid,
        email: principal.email,
    }))
}
