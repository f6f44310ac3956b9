// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Contact form submissions.

use axum::http::StatusCode;
use serde_json::json;

mod common;

#[tokio::test]
async fn test_contact_stored_unread() {
    let (app, store) = common::create_test_app();

    let (status, body) = common::send_json(
        app,
        "POST",
        "/api/contact",
        json!({
            "name": "  Huda ",
            "email": "huda@example.com",
            "phone": "",
            "subject": "Private lessons",
            "message": "Are weekend sessions available?"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let id = body["id"].as_str().unwrap();

    let stored = store.contact(id).unwrap();
    assert_eq!(stored.name, "Huda");
    assert_eq!(stored.phone, None);
    assert_eq!(stored.subject.as_deref(), Some("Private lessons"));
    assert!(!stored.read);
}

#[tokio::test]
async fn test_contact_invalid_email() {
    let (app, store) = common::create_test_app();

    let (status, _) = common::send_json(
        app,
        "POST",
        "/api/contact",
        json!({ "name": "Huda", "email": "not-an-email", "message": "Hello" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(store.operation_count(), 0);
}

#[tokio::test]
async fn test_contact_missing_message() {
    let (app, store) = common::create_test_app();

    let (status, _) = common::send_json(
        app,
        "POST",
        "/api/contact",
        json!({ "name": "Huda", "email": "huda@example.com", "message": "   " }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(store.operation_count(), 0);
}

#[tokio::test]
async fn test_contact_message_too_long() {
    let (app, _) = common::create_test_app();

    let (status, _) = common::send_json(
        app,
        "POST",
        "/api/contact",
        json!({
            "name": "Huda",
            "email": "huda@example.com",
            "message": "x".repeat(5001)
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_contact_degraded_mode() {
    let app = common::create_degraded_app();

    let (status, body) = common::send_json(
        app,
        "POST",
        "/api/contact",
        json!({ "name": "Huda", "email": "huda@example.com", "message": "Hello" }),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "unavailable");
}
