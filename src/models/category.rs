// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Course category model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum accepted category name length (after trimming).
pub const MAX_CATEGORY_NAME_LEN: usize = 100;

/// Category stored in Firestore under a generated document ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDocument {
    /// Trimmed, unique (case-sensitive)
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A category together with its document ID.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: String,
    pub doc: CategoryDocument,
}
