// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin edits to test (quiz) documents.
//!
//! Test documents have no fixed schema; the admin UI sends whatever fields it
//! edits alongside the caller's `idToken`.

use crate::error::{AppError, Result};
use crate::models::test_doc::{is_simple_field_name, UPDATED_AT_FIELD};
use crate::models::TestFields;
use crate::routes::{json_body, resolve_id_token, validate_document_id};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, State},
    http::HeaderMap,
    routing::put,
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

const ID_TOKEN_FIELD: &str = "idToken";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/tests/{id}", put(update_test).delete(delete_test))
}

/// Remove `idToken` from a field map, returning it if it was a string.
fn take_id_token(fields: &mut TestFields) -> Option<String> {
    match fields.remove(ID_TOKEN_FIELD) {
        Some(Value::String(token)) => Some(token),
        _ => None,
    }
}

/// Strip fields the caller may not set and check the rest are addressable.
fn prepare_update(mut fields: TestFields) -> Result<TestFields> {
    fields.remove("id");
    fields.remove(UPDATED_AT_FIELD);

    if fields.is_empty() {
        return Err(AppError::BadRequest("No fields to update".to_string()));
    }

    if let Some(bad) = fields.keys().find(|k| !is_simple_field_name(k)) {
        return Err(AppError::BadRequest(format!("Invalid field name: {}", bad)));
    }

    Ok(fields)
}

/// Merge the submitted fields into a test document (admin only).
async fn update_test(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    payload: std::result::Result<Json<TestFields>, JsonRejection>,
) -> Result<Json<TestFields>> {
    let mut fields = json_body(payload)?;
    let body_token = take_id_token(&mut fields);
    let token = resolve_id_token(body_token.as_deref(), &headers);
    let admin = state.admin_guard.authorize(token).await?;

    validate_document_id("test", &id)?;
    let fields = prepare_update(fields)?;

    let mut merged = state.db.merge_test(&id, &fields).await?;
    merged.insert("id".to_string(), Value::String(id.clone()));

    tracing::info!(
        admin_uid = %admin.uid,
        test_id = %id,
        fields = fields.len(),
        "Test updated"
    );

    Ok(Json(merged))
}

#[derive(Serialize)]
pub struct DeleteTestResponse {
    pub id: String,
    pub message: String,
}

/// Delete a test document (admin only).
///
/// The body is optional since some clients send the token only in the
/// `Authorization` header.
async fn delete_test(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<DeleteTestResponse>> {
    let mut fields = if body.is_empty() {
        TestFields::new()
    } else {
        serde_json::from_slice::<TestFields>(&body)
            .map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {}", e)))?
    };
    let body_token = take_id_token(&mut fields);
    let token = resolve_id_token(body_token.as_deref(), &headers);
    let admin = state.admin_guard.authorize(token).await?;

    validate_document_id("test", &id)?;
    state.db.delete_test(&id).await?;

    tracing::info!(admin_uid = %admin.uid, test_id = %id, "Test deleted");

    Ok(Json(DeleteTestResponse {
        id,
        message: "Test deleted successfully".to_string(),
    }))
}
