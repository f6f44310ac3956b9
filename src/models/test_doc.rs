// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Schema-less test (quiz) documents.

use serde_json::{Map, Value};

/// Field map of a document in the `tests` collection.
pub type TestFields = Map<String, Value>;

/// Field name the store stamps on every merge.
pub const UPDATED_AT_FIELD: &str = "updatedAt";

/// Whether `key` can be used as a top-level Firestore field path without
/// quoting.
pub fn is_simple_field_name(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    !key.starts_with("__") && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_field_names() {
        assert!(is_simple_field_name("title"));
        assert!(is_simple_field_name("question_count"));
        assert!(is_simple_field_name("_draft"));
        assert!(!is_simple_field_name(""));
        assert!(!is_simple_field_name("9lives"));
        assert!(!is_simple_field_name("a.b"));
        assert!(!is_simple_field_name("__name__"));
        assert!(!is_simple_field_name("with space"));
    }
}
