// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Contact form submission model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Contact message stored in Firestore. Written once, read by staff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactDocument {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    pub message: String,
    #[serde(default)]
    pub read: bool,
    pub created_at: DateTime<Utc>,
}
