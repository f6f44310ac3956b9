// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process document store.
//!
//! Used by the test suite and for local runs without Firestore. Each
//! collection is a `DashMap`; single-document writes go through the entry
//! API so create-if-absent is atomic.

use crate::db::{category_document_id, generate_document_id, DocumentStore};
use crate::error::AppError;
use crate::models::test_doc::UPDATED_AT_FIELD;
use crate::models::{
    Category, CategoryDocument, ContactDocument, LoginUpdate, NewUser, ProfileUpdate, TestFields,
    UserDocument,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Document store backed by process memory.
#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<String, UserDocument>,
    categories: DashMap<String, CategoryDocument>,
    contacts: DashMap<String, ContactDocument>,
    tests: DashMap<String, TestFields>,
    operations: AtomicUsize,
    last_stamp_micros: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of store operations served so far.
    pub fn operation_count(&self) -> usize {
        self.operations.load(Ordering::SeqCst)
    }

    /// Seed a user document verbatim.
    pub fn insert_user(&self, uid: &str, user: UserDocument) {
        self.users.insert(uid.to_string(), user);
    }

    /// Seed a test document verbatim.
    pub fn insert_test(&self, id: &str, fields: TestFields) {
        self.tests.insert(id.to_string(), fields);
    }

    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    pub fn contact(&self, id: &str) -> Option<ContactDocument> {
        self.contacts.get(id).map(|c| c.clone())
    }

    fn record_op(&self) {
        self.operations.fetch_add(1, Ordering::SeqCst);
    }

    /// Wall-clock time that never goes backwards within this store.
    fn now(&self) -> DateTime<Utc> {
        let wall = Utc::now().timestamp_micros().max(0) as u64;
        let prev = self.last_stamp_micros.fetch_max(wall, Ordering::SeqCst);
        let micros = wall.max(prev) as i64;
        DateTime::from_timestamp_micros(micros).unwrap_or_else(Utc::now)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_user(&self, uid: &str) -> Result<Option<UserDocument>, AppError> {
        self.record_op();
        Ok(self.users.get(uid).map(|u| u.clone()))
    }

    async fn create_user(
        &self,
        uid: &str,
        user: &NewUser,
    ) -> Result<Option<UserDocument>, AppError> {
        self.record_op();
        match self.users.entry(uid.to_string()) {
            Entry::Occupied(_) => Ok(None),
            Entry::Vacant(slot) => {
                let doc = UserDocument::new(user, self.now());
                slot.insert(doc.clone());
                Ok(Some(doc))
            }
        }
    }

    async fn apply_login(
        &self,
        uid: &str,
        update: &LoginUpdate,
    ) -> Result<UserDocument, AppError> {
        self.record_op();
        let mut entry = self
            .users
            .get_mut(uid)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", uid)))?;
        entry.apply_login(update, self.now());
        Ok(entry.clone())
    }

    async fn update_profile(
        &self,
        uid: &str,
        update: &ProfileUpdate,
    ) -> Result<UserDocument, AppError> {
        self.record_op();
        let mut entry = self
            .users
            .get_mut(uid)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", uid)))?;
        entry.apply_profile(update, self.now());
        Ok(entry.clone())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        self.record_op();
        let mut categories: Vec<Category> = self
            .categories
            .iter()
            .map(|c| Category {
                id: c.key().clone(),
                doc: c.value().clone(),
            })
            .collect();
        categories.sort_by(|a, b| a.doc.name.cmp(&b.doc.name));
        Ok(categories)
    }

    async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>, AppError> {
        self.record_op();
        Ok(self
            .categories
            .iter()
            .find(|c| c.value().name == name)
            .map(|c| Category {
                id: c.key().clone(),
                doc: c.value().clone(),
            }))
    }

    async fn add_category(&self, name: &str) -> Result<Option<Category>, AppError> {
        self.record_op();
        let id = category_document_id(name);
        match self.categories.entry(id.clone()) {
            Entry::Occupied(_) => Ok(None),
            Entry::Vacant(slot) => {
                let now = self.now();
                let doc = CategoryDocument {
                    name: name.to_string(),
                    created_at: now,
                    updated_at: now,
                };
                slot.insert(doc.clone());
                Ok(Some(Category { id, doc }))
            }
        }
    }

    async fn add_contact(&self, contact: &ContactDocument) -> Result<String, AppError> {
        self.record_op();
        let mut doc = contact.clone();
        doc.created_at = self.now();
        let id = generate_document_id();
        self.contacts.insert(id.clone(), doc);
        Ok(id)
    }

    async fn get_test(&self, id: &str) -> Result<Option<TestFields>, AppError> {
        self.record_op();
        Ok(self.tests.get(id).map(|t| t.clone()))
    }

    async fn merge_test(&self, id: &str, fields: &TestFields) -> Result<TestFields, AppError> {
        self.record_op();
        let mut entry = self
            .tests
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("Test {} not found", id)))?;
        for (key, value) in fields {
            entry.insert(key.clone(), value.clone());
        }
        entry.insert(
            UPDATED_AT_FIELD.to_string(),
            serde_json::Value::String(crate::time_utils::format_utc_rfc3339(self.now())),
        );
        Ok(entry.clone())
    }

    async fn delete_test(&self, id: &str) -> Result<(), AppError> {
        self.record_op();
        self.tests
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Test {} not found", id)))
    }
}
