// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile documents keyed by Firebase UID)
//! - Categories (unique course categories)
//! - Contacts (contact-form submissions)
//! - Tests (schema-less quiz documents)

use crate::db::{category_document_id, collections, generate_document_id, DocumentStore};
use crate::error::AppError;
use crate::models::test_doc::UPDATED_AT_FIELD;
use crate::models::{
    Category, CategoryDocument, ContactDocument, LoginUpdate, NewUser, ProfileUpdate, TestFields,
    UserDocument,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use firestore::errors::FirestoreError;
use firestore::FirestoreWritePrecondition;
use serde::{Deserialize, Serialize};

/// Prefix of the metadata keys the firestore crate injects into decoded maps.
const FIRESTORE_META_PREFIX: &str = "_firestore_";

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

/// Login refresh as written to Firestore.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginPatch {
    name: String,
    email: String,
    #[serde(rename = "photoURL", default, skip_serializing_if = "Option::is_none")]
    photo_url: Option<String>,
    updated_at: DateTime<Utc>,
}

/// Profile edit as written to Firestore; only masked fields are applied.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfilePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    birth_date: Option<String>,
    #[serde(rename = "photoURL", default, skip_serializing_if = "Option::is_none")]
    photo_url: Option<String>,
    updated_at: DateTime<Utc>,
}

/// Category as read back from a query, including the document ID.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CategoryRow {
    #[serde(alias = "_firestore_id")]
    id: Option<String>,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: row.id.unwrap_or_default(),
            doc: CategoryDocument {
                name: row.name,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
        }
    }
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// A client with no Firestore connection (degraded mode).
    ///
    /// Every operation answers `AppError::Unavailable`.
    pub fn unconfigured() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if not configured.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client.as_ref().ok_or_else(AppError::not_configured)
    }
}

/// Map a failed `Exists` precondition to `NotFound`.
fn user_write_error(uid: &str, err: FirestoreError) -> AppError {
    match err {
        FirestoreError::DataNotFoundError(_) => {
            AppError::NotFound(format!("User {} not found", uid))
        }
        other => AppError::Database(other.to_string()),
    }
}

fn strip_metadata(mut fields: TestFields) -> TestFields {
    fields.retain(|key, _| !key.starts_with(FIRESTORE_META_PREFIX));
    fields
}

#[async_trait]
impl DocumentStore for FirestoreDb {
    // ─── User Operations ─────────────────────────────────────────

    async fn get_user(&self, uid: &str) -> Result<Option<UserDocument>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(uid)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn create_user(
        &self,
        uid: &str,
        user: &NewUser,
    ) -> Result<Option<UserDocument>, AppError> {
        let doc = UserDocument::new(user, Utc::now());

        // `insert` is a Firestore create: it fails if the document exists.
        let result: Result<UserDocument, FirestoreError> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::USERS)
            .document_id(uid)
            .object(&doc)
            .execute()
            .await;

        match result {
            Ok(created) => Ok(Some(created)),
            Err(FirestoreError::DataConflictError(_)) => {
                tracing::debug!(uid, "User document already exists");
                Ok(None)
            }
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    async fn apply_login(
        &self,
        uid: &str,
        update: &LoginUpdate,
    ) -> Result<UserDocument, AppError> {
        let patch = LoginPatch {
            name: update.name.clone(),
            email: update.email.clone(),
            photo_url: update.photo_url.clone(),
            updated_at: Utc::now(),
        };

        let mut mask = vec!["name", "email", "updatedAt"];
        if patch.photo_url.is_some() {
            mask.push("photoURL");
        }

        let result: Result<UserDocument, FirestoreError> = self
            .get_client()?
            .fluent()
            .update()
            .fields(mask)
            .in_col(collections::USERS)
            .precondition(FirestoreWritePrecondition::Exists(true))
            .document_id(uid)
            .object(&patch)
            .execute()
            .await;

        result.map_err(|e| user_write_error(uid, e))
    }

    async fn update_profile(
        &self,
        uid: &str,
        update: &ProfileUpdate,
    ) -> Result<UserDocument, AppError> {
        let patch = ProfilePatch {
            name: update.name.clone(),
            phone: update.phone.clone(),
            birth_date: update.birth_date.clone(),
            photo_url: update.photo_url.clone(),
            updated_at: Utc::now(),
        };

        let result: Result<UserDocument, FirestoreError> = self
            .get_client()?
            .fluent()
            .update()
            .fields(update.field_paths())
            .in_col(collections::USERS)
            .precondition(FirestoreWritePrecondition::Exists(true))
            .document_id(uid)
            .object(&patch)
            .execute()
            .await;

        result.map_err(|e| user_write_error(uid, e))
    }

    // ─── Category Operations ─────────────────────────────────────

    async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        let rows: Vec<CategoryRow> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::CATEGORIES)
            .order_by([("name", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>, AppError> {
        let name = name.to_string();
        let rows: Vec<CategoryRow> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::CATEGORIES)
            .filter(move |q| q.for_all([q.field("name").eq(name.clone())]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows.into_iter().next().map(Category::from))
    }

    async fn add_category(&self, name: &str) -> Result<Option<Category>, AppError> {
        let now = Utc::now();
        let doc = CategoryDocument {
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        };
        let id = category_document_id(name);

        // Keyed by name, so a concurrent duplicate loses the create.
        let result: Result<CategoryDocument, FirestoreError> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::CATEGORIES)
            .document_id(&id)
            .object(&doc)
            .execute()
            .await;

        match result {
            Ok(_) => Ok(Some(Category { id, doc })),
            Err(FirestoreError::DataConflictError(_)) => {
                tracing::debug!(name, "Category already exists");
                Ok(None)
            }
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    // ─── Contact Operations ──────────────────────────────────────

    async fn add_contact(&self, contact: &ContactDocument) -> Result<String, AppError> {
        let mut doc = contact.clone();
        doc.created_at = Utc::now();
        let id = generate_document_id();

        let _: ContactDocument = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::CONTACTS)
            .document_id(&id)
            .object(&doc)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(id)
    }

    // ─── Test Operations ─────────────────────────────────────────

    async fn get_test(&self, id: &str) -> Result<Option<TestFields>, AppError> {
        let fields: Option<TestFields> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::TESTS)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(fields.map(strip_metadata))
    }

    async fn merge_test(&self, id: &str, fields: &TestFields) -> Result<TestFields, AppError> {
        if self.get_test(id).await?.is_none() {
            return Err(AppError::NotFound(format!("Test {} not found", id)));
        }

        let mut patch = fields.clone();
        patch.insert(
            UPDATED_AT_FIELD.to_string(),
            serde_json::Value::String(crate::time_utils::format_utc_rfc3339(Utc::now())),
        );
        let mask: Vec<String> = patch.keys().cloned().collect();

        let merged: TestFields = self
            .get_client()?
            .fluent()
            .update()
            .fields(mask)
            .in_col(collections::TESTS)
            .document_id(id)
            .object(&patch)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(strip_metadata(merged))
    }

    async fn delete_test(&self, id: &str) -> Result<(), AppError> {
        if self.get_test(id).await?.is_none() {
            return Err(AppError::NotFound(format!("Test {} not found", id)));
        }

        self.get_client()?
            .fluent()
            .delete()
            .from(collections::TESTS)
            .document_id(id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_client_is_unavailable() {
        let db = FirestoreDb::unconfigured();

        let err = db.get_user("uid").await.unwrap_err();
        assert!(matches!(err, AppError::Unavailable(_)));

        let err = db.list_categories().await.unwrap_err();
        assert!(matches!(err, AppError::Unavailable(_)));
    }

    #[test]
    fn test_strip_metadata() {
        let mut fields = TestFields::new();
        fields.insert("_firestore_id".into(), "abc".into());
        fields.insert("_firestore_updated".into(), "2026-01-01T00:00:00Z".into());
        fields.insert("title".into(), "Nahw".into());

        let stripped = strip_metadata(fields);
        assert_eq!(stripped.len(), 1);
        assert_eq!(stripped["title"], "Nahw");
    }
}
