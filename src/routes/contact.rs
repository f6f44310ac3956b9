// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Public contact form.

use crate::error::{AppError, Result};
use crate::models::ContactDocument;
use crate::routes::json_body;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/contact", post(submit_contact))
}

#[derive(Deserialize, Validate)]
pub struct ContactRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    name: String,
    #[serde(default)]
    #[validate(email(message = "A valid email is required"))]
    email: String,
    #[serde(default)]
    #[validate(length(max = 30, message = "Phone number is too long"))]
    phone: Option<String>,
    #[serde(default)]
    #[validate(length(max = 200, message = "Subject must be at most 200 characters"))]
    subject: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, max = 5000, message = "Message must be 1-5000 characters"))]
    message: String,
}

impl ContactRequest {
    /// Trim every field; blank optional fields become `None`.
    fn trimmed(self) -> Self {
        fn optional(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: optional(self.phone),
            subject: optional(self.subject),
            message: self.message.trim().to_string(),
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ContactResponse {
    pub id: String,
    pub message: String,
}

/// Store a contact form submission as an unread message.
async fn submit_contact(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<ContactRequest>, JsonRejection>,
) -> Result<Json<ContactResponse>> {
    let request = json_body(payload)?.trimmed();
    request
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let doc = ContactDocument {
        name: request.name,
        email: request.email,
        phone: request.phone,
        subject: request.subject,
        message: request.message,
        read: false,
        created_at: chrono::Utc::now(),
    };

    let id = state.db.add_contact(&doc).await?;

    tracing::info!(contact_id = %id, "Contact message received");

    Ok(Json(ContactResponse {
        id,
        message: "Message sent successfully".to_string(),
    }))
}
