// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sign-in routes.
//!
//! The website signs users in with the Firebase client SDK and hands the
//! resulting ID token to these routes, which verify it and keep the user's
//! Firestore document in step.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::routes::json_body;
use crate::routes::users::UserResponse;
use crate::services::upsert_user;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/google", post(google_sign_in))
        .route("/api/auth/verify", post(verify))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// ─── Google Sign-In ──────────────────────────────────────────

#[derive(Deserialize)]
pub struct GoogleSignInRequest {
    #[serde(rename = "idToken", default)]
    id_token: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SignInResponse {
    pub uid: String,
    pub email: String,
    pub name: String,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
}

/// Verify a Google sign-in token and create or refresh the user document.
async fn google_sign_in(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<GoogleSignInRequest>, JsonRejection>,
) -> Result<Json<SignInResponse>> {
    let request = json_body(payload)?;
    let auth = state.auth()?;

    let token = non_blank(request.id_token.as_deref())
        .ok_or_else(|| AppError::BadRequest("idToken is required".to_string()))?;

    let claims = auth.verify_id_token(token).await?;
    let user = upsert_user(state.db.as_ref(), &claims, request.name.as_deref()).await?;

    tracing::info!(uid = %claims.uid, "Google sign-in completed");

    Ok(Json(SignInResponse {
        uid: claims.uid,
        email: user.email,
        name: user.name,
        photo_url: user.photo_url,
    }))
}

// ─── Session Verification ────────────────────────────────────

/// Either an ID token or email/password credentials.
#[derive(Deserialize)]
pub struct VerifyRequest {
    #[serde(rename = "idToken", default)]
    id_token: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

/// Verify a session and return the caller's profile.
///
/// Accepts an ID token, or email/password which are exchanged for one
/// through the Identity Toolkit. A missing user document is created.
async fn verify(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<UserResponse>> {
    let request = json_body(payload)?;
    let auth = state.auth()?;

    let claims = if let Some(token) = non_blank(request.id_token.as_deref()) {
        auth.verify_id_token(token).await?
    } else {
        let email = non_blank(request.email.as_deref());
        let password = request.password.as_deref().filter(|p| !p.is_empty());
        let (Some(email), Some(password)) = (email, password) else {
            return Err(AppError::BadRequest(
                "Provide idToken, or email and password".to_string(),
            ));
        };

        let session = auth.sign_in_with_password(email, password).await?;
        tracing::debug!(uid = %session.uid, "Password sign-in succeeded");
        auth.verify_id_token(&session.id_token).await?
    };

    let user = match state.db.get_user(&claims.uid).await? {
        Some(user) => user,
        None => upsert_user(state.db.as_ref(), &claims, None).await?,
    };

    Ok(Json(UserResponse::from_document(&claims.uid, user)))
}
