//! Database layer (Firestore, plus an in-memory store for tests and local runs).

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

use crate::error::AppError;
use crate::models::{Category, ContactDocument, LoginUpdate, NewUser, ProfileUpdate, TestFields, UserDocument};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const CATEGORIES: &str = "categories";
    pub const CONTACTS: &str = "contacts";
    pub const TESTS: &str = "tests";
}

/// Typed operations the route handlers need from the document store.
///
/// Implementations stamp `createdAt`/`updatedAt` themselves at write time.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    // ─── Users ───────────────────────────────────────────────────

    async fn get_user(&self, uid: &str) -> Result<Option<UserDocument>, AppError>;

    /// Create the user document only if none exists.
    ///
    /// Returns `None` when a document with this UID is already present.
    async fn create_user(&self, uid: &str, user: &NewUser)
        -> Result<Option<UserDocument>, AppError>;

    /// Refresh login fields, leaving everything else untouched.
    async fn apply_login(&self, uid: &str, update: &LoginUpdate)
        -> Result<UserDocument, AppError>;

    /// Apply profile edits. `NotFound` if the user does not exist.
    async fn update_profile(
        &self,
        uid: &str,
        update: &ProfileUpdate,
    ) -> Result<UserDocument, AppError>;

    // ─── Categories ──────────────────────────────────────────────

    async fn list_categories(&self) -> Result<Vec<Category>, AppError>;

    /// Exact (case-sensitive) lookup by name.
    async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>, AppError>;

    /// Create a category keyed by its name.
    ///
    /// Returns `None` when a category with exactly this name already exists.
    async fn add_category(&self, name: &str) -> Result<Option<Category>, AppError>;

    // ─── Contacts ────────────────────────────────────────────────

    /// Store a contact message, returning its generated ID.
    async fn add_contact(&self, contact: &ContactDocument) -> Result<String, AppError>;

    // ─── Tests ───────────────────────────────────────────────────

    async fn get_test(&self, id: &str) -> Result<Option<TestFields>, AppError>;

    /// Merge `fields` into an existing test document. `NotFound` if absent.
    async fn merge_test(&self, id: &str, fields: &TestFields) -> Result<TestFields, AppError>;

    /// Delete a test document. `NotFound` if absent.
    async fn delete_test(&self, id: &str) -> Result<(), AppError>;
}

/// Document ID of the category named `name`. Equal names share an ID.
pub fn category_document_id(name: &str) -> String {
    uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_OID, name.as_bytes())
        .simple()
        .to_string()
}

/// New document ID in the same alphabet Firestore auto-IDs use.
pub fn generate_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_document_id_is_exact() {
        assert_eq!(category_document_id("Math"), category_document_id("Math"));
        assert_ne!(category_document_id("Math"), category_document_id("math"));
        assert!(!category_document_id("a/b").contains('/'));
    }
}
