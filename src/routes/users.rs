// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profile and account creation routes.

use crate::error::{AppError, Result};
use crate::models::{IdentityClaims, ProfileUpdate, UserDocument};
use crate::routes::{json_body, validate_document_id};
use crate::services::upsert_user;
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

const MAX_NAME_LEN: usize = 100;
const MAX_PHONE_LEN: usize = 30;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users/create", post(create_account))
        .route("/api/users/{uid}", get(get_user).put(update_user))
}

// ─── User Profile ────────────────────────────────────────────

/// User profile as returned to the website.
#[derive(Serialize, Debug, Clone)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub uid: String,
    pub name: String,
    pub email: String,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    pub phone: String,
    pub birth_date: String,
    pub created_at: String,
    pub updated_at: String,
}

impl UserResponse {
    pub fn from_document(uid: &str, doc: UserDocument) -> Self {
        Self {
            uid: uid.to_string(),
            name: doc.name,
            email: doc.email,
            photo_url: doc.photo_url,
            phone: doc.phone,
            birth_date: doc.birth_date,
            created_at: format_utc_rfc3339(doc.created_at),
            updated_at: format_utc_rfc3339(doc.updated_at),
        }
    }
}

/// Get a user's profile document.
async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<String>,
) -> Result<Json<UserResponse>> {
    validate_document_id("user", &uid)?;

    let doc = state
        .db
        .get_user(&uid)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", uid)))?;

    Ok(Json(UserResponse::from_document(&uid, doc)))
}

/// Check profile edits before they reach the store.
fn validate_profile_update(update: &ProfileUpdate) -> Result<ProfileUpdate> {
    if update.is_empty() {
        return Err(AppError::BadRequest("No fields to update".to_string()));
    }

    let mut cleaned = update.clone();

    if let Some(name) = &update.name {
        let name = name.trim();
        if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
            return Err(AppError::BadRequest(format!(
                "Name must be 1-{} characters",
                MAX_NAME_LEN
            )));
        }
        cleaned.name = Some(name.to_string());
    }

    if let Some(phone) = &update.phone {
        let phone = phone.trim();
        if phone.chars().count() > MAX_PHONE_LEN {
            return Err(AppError::BadRequest("Phone number is too long".to_string()));
        }
        cleaned.phone = Some(phone.to_string());
    }

    if let Some(birth_date) = &update.birth_date {
        let birth_date = birth_date.trim();
        // Empty clears the field.
        if !birth_date.is_empty()
            && chrono::NaiveDate::parse_from_str(birth_date, "%Y-%m-%d").is_err()
        {
            return Err(AppError::BadRequest(
                "birthDate must be formatted as YYYY-MM-DD".to_string(),
            ));
        }
        cleaned.birth_date = Some(birth_date.to_string());
    }

    Ok(cleaned)
}

/// Update editable profile fields (name, phone, birth date, photo).
async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<String>,
    payload: std::result::Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<Json<UserResponse>> {
    validate_document_id("user", &uid)?;
    let update = validate_profile_update(&json_body(payload)?)?;

    let doc = state.db.update_profile(&uid, &update).await?;

    tracing::info!(uid = %uid, "Updated user profile");
    Ok(Json(UserResponse::from_document(&uid, doc)))
}

// ─── Account Creation ────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct CreateAccountRequest {
    #[validate(email(message = "A valid email is required"))]
    email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    password: String,
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    name: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CreateAccountResponse {
    pub uid: String,
    pub email: String,
    pub name: String,
}

/// Create an email/password account and its user document.
async fn create_account(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<CreateAccountRequest>, JsonRejection>,
) -> Result<Json<CreateAccountResponse>> {
    let mut request = json_body(payload)?;
    request.email = request.email.trim().to_string();
    request.name = request.name.trim().to_string();
    request
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let auth = state.auth()?;
    let record = auth
        .create_user(&request.email, &request.password, &request.name)
        .await?;

    let claims = IdentityClaims {
        uid: record.uid.clone(),
        email: Some(record.email.clone()),
        name: record.display_name.clone(),
        picture: None,
    };
    let doc = upsert_user(state.db.as_ref(), &claims, Some(&request.name)).await?;

    tracing::info!(uid = %record.uid, "Account created");

    Ok(Json(CreateAccountResponse {
        uid: record.uid,
        email: record.email,
        name: doc.name,
    }))
}
