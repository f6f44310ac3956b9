// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running
//! (FIRESTORE_EMULATOR_HOST set); otherwise they are skipped.

use std::sync::Arc;
use tutor_site_api::db::DocumentStore;
use tutor_site_api::error::AppError;
use tutor_site_api::models::{
    ContactDocument, IdentityClaims, LoginUpdate, NewUser, ProfileUpdate, TestFields,
};
use tutor_site_api::services::upsert_user;

mod common;
use common::test_db;

/// Generate a unique ID for test isolation.
fn unique_id(prefix: &str) -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}-{}", prefix, nanos)
}

fn new_user(name: &str) -> NewUser {
    NewUser {
        name: name.to_string(),
        email: format!("{}@example.com", name),
        photo_url: None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// USER TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_create_user_is_conditional() {
    require_emulator!();

    let db = test_db().await;
    let uid = unique_id("user");

    assert!(db.get_user(&uid).await.unwrap().is_none());

    let created = db.create_user(&uid, &new_user("first")).await.unwrap();
    let created = created.expect("first create should win");
    assert_eq!(created.name, "first");
    assert_eq!(created.created_at, created.updated_at);

    let second = db.create_user(&uid, &new_user("second")).await.unwrap();
    assert!(second.is_none(), "second create must not overwrite");

    let fetched = db.get_user(&uid).await.unwrap().unwrap();
    assert_eq!(fetched.name, "first");
}

#[tokio::test]
async fn test_login_and_profile_updates_are_partial() {
    require_emulator!();

    let db = test_db().await;
    let uid = unique_id("user");
    db.create_user(&uid, &new_user("omar")).await.unwrap();

    let profile = ProfileUpdate {
        phone: Some("0100000000".to_string()),
        ..Default::default()
    };
    db.update_profile(&uid, &profile).await.unwrap();

    let login = LoginUpdate {
        name: "Omar".to_string(),
        email: "omar@example.com".to_string(),
        photo_url: None,
    };
    let after = db.apply_login(&uid, &login).await.unwrap();

    assert_eq!(after.name, "Omar");
    assert_eq!(after.phone, "0100000000");
    assert!(after.updated_at >= after.created_at);
}

#[tokio::test]
async fn test_update_profile_missing_user() {
    require_emulator!();

    let db = test_db().await;
    let profile = ProfileUpdate {
        name: Some("Ghost".to_string()),
        ..Default::default()
    };

    let err = db
        .update_profile(&unique_id("ghost"), &profile)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_concurrent_first_logins_create_once() {
    require_emulator!();

    let db: Arc<dyn DocumentStore> = Arc::new(test_db().await);
    let uid = unique_id("race");

    let mut handles = Vec::new();
    for i in 0..5 {
        let db = db.clone();
        let claims = IdentityClaims {
            uid: uid.clone(),
            email: Some(format!("racer{}@example.com", i)),
            name: Some(format!("Racer {}", i)),
            picture: None,
        };
        handles.push(tokio::spawn(async move {
            upsert_user(db.as_ref(), &claims, None).await
        }));
    }

    let mut created_at = None;
    for handle in handles {
        let doc = handle.await.unwrap().unwrap();
        let first = *created_at.get_or_insert(doc.created_at);
        assert_eq!(doc.created_at, first);
    }
}

#[tokio::test]
async fn test_user_updates_require_existing_document() {
    require_emulator!();

    let db = test_db().await;
    let uid = unique_id("gone");
    let login = LoginUpdate {
        name: "Gone".to_string(),
        email: "gone@example.com".to_string(),
        photo_url: None,
    };

    let err = db.apply_login(&uid, &login).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert!(db.get_user(&uid).await.unwrap().is_none());
}

#[tokio::test]
async fn test_concurrent_category_creates_once() {
    require_emulator!();

    let db: Arc<dyn DocumentStore> = Arc::new(test_db().await);
    let name = unique_id("Race");

    let mut handles = Vec::new();
    for _ in 0..8 {
        let db = db.clone();
        let name = name.clone();
        handles.push(tokio::spawn(async move { db.add_category(&name).await }));
    }

    let mut created = 0;
    for handle in handles {
        if handle.await.unwrap().unwrap().is_some() {
            created += 1;
        }
    }
    assert_eq!(created, 1);
}

// ═══════════════════════════════════════════════════════════════════════════
// CATEGORY / CONTACT / TEST DOCUMENT TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_category_lookup_by_name() {
    require_emulator!();

    let db = test_db().await;
    let name = unique_id("Category");

    assert!(db.find_category_by_name(&name).await.unwrap().is_none());

    let added = db.add_category(&name).await.unwrap().unwrap();
    assert!(db.add_category(&name).await.unwrap().is_none());
    let found = db.find_category_by_name(&name).await.unwrap().unwrap();
    assert_eq!(found.id, added.id);

    assert!(db
        .find_category_by_name(&name.to_lowercase())
        .await
        .unwrap()
        .is_none());

    let listed = db.list_categories().await.unwrap();
    assert!(listed.iter().any(|c| c.id == added.id && c.doc.name == name));
}

#[tokio::test]
async fn test_add_contact() {
    require_emulator!();

    let db = test_db().await;
    let contact = ContactDocument {
        name: "Huda".to_string(),
        email: "huda@example.com".to_string(),
        phone: None,
        subject: Some("Lessons".to_string()),
        message: "Hello".to_string(),
        read: false,
        created_at: chrono::Utc::now(),
    };

    let id = db.add_contact(&contact).await.unwrap();
    assert!(!id.is_empty());
}

#[tokio::test]
async fn test_missing_test_document() {
    require_emulator!();

    let db = test_db().await;
    let id = unique_id("test");

    assert!(db.get_test(&id).await.unwrap().is_none());

    let mut fields = TestFields::new();
    fields.insert("title".to_string(), "Nahw".into());
    assert!(matches!(
        db.merge_test(&id, &fields).await.unwrap_err(),
        AppError::NotFound(_)
    ));
    assert!(matches!(
        db.delete_test(&id).await.unwrap_err(),
        AppError::NotFound(_)
    ));
}
