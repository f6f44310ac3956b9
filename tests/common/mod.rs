// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use jsonwebtoken::{encode, Algorithm, DecodingKey, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tower::ServiceExt;
use tutor_site_api::config::Config;
use tutor_site_api::db::{DocumentStore, FirestoreDb, MemoryStore};
use tutor_site_api::routes::create_router;
use tutor_site_api::services::{AdminGuard, AdminPolicy, FirebaseAuth};
use tutor_site_api::AppState;

pub const TEST_PROJECT: &str = "test-project";
pub const TEST_KID: &str = "test-kid";
pub const ADMIN_EMAIL: &str = "admin@example.com";

const PRIVATE_KEY_PEM: &str = include_str!("../fixtures/test_rsa_private.pem");
const PUBLIC_KEY_PEM: &str = include_str!("../fixtures/test_rsa_public.pem");

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new(TEST_PROJECT)
        .await
        .expect("Failed to connect to Firestore emulator")
}

fn test_auth(config: &Config) -> Arc<FirebaseAuth> {
    let key = DecodingKey::from_rsa_pem(PUBLIC_KEY_PEM.as_bytes()).expect("test public key");
    Arc::new(
        FirebaseAuth::new_with_static_key(TEST_PROJECT, config, TEST_KID, key)
            .expect("static-key verifier"),
    )
}

/// Create a test app backed by an in-memory store, with the given config.
#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let db: Arc<dyn DocumentStore> = store.clone();
    let auth = test_auth(&config);
    let admin_guard = AdminGuard::new(
        Some(auth.clone()),
        AdminPolicy::new(config.admin_emails.iter()),
    );

    let state = Arc::new(AppState {
        config,
        db,
        auth: Some(auth),
        admin_guard,
    });

    (create_router(state), store)
}

/// Create a test app with offline dependencies.
/// Returns the router and the in-memory store behind it.
#[allow(dead_code)]
pub fn create_test_app() -> (Router, Arc<MemoryStore>) {
    create_test_app_with_config(Config::test_default())
}

/// Create an app with no Firebase configuration at all.
#[allow(dead_code)]
pub fn create_degraded_app() -> Router {
    let config = Config {
        firebase_project_id: None,
        firebase_api_key: None,
        use_memory_store: false,
        ..Config::test_default()
    };
    let admin_guard = AdminGuard::new(None, AdminPolicy::new(config.admin_emails.iter()));

    let state = Arc::new(AppState {
        config,
        db: Arc::new(FirestoreDb::unconfigured()),
        auth: None,
        admin_guard,
    });

    create_router(state)
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

/// Baseline Firebase ID token claims for `uid`.
#[allow(dead_code)]
pub fn id_token_claims(uid: &str, email: Option<&str>, name: Option<&str>) -> Value {
    let now = now_secs();
    let mut claims = json!({
        "iss": format!("https://securetoken.google.com/{}", TEST_PROJECT),
        "aud": TEST_PROJECT,
        "sub": uid,
        "iat": now,
        "auth_time": now,
        "exp": now + 3600,
    });
    if let Some(email) = email {
        claims["email"] = json!(email);
    }
    if let Some(name) = name {
        claims["name"] = json!(name);
    }
    claims
}

/// Sign arbitrary claims with the test key.
#[allow(dead_code)]
pub fn sign_claims(claims: &Value) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(TEST_KID.to_string());
    let key = EncodingKey::from_rsa_pem(PRIVATE_KEY_PEM.as_bytes()).expect("test private key");
    encode(&header, claims, &key).expect("sign test token")
}

/// Mint a Firebase-shaped ID token.
#[allow(dead_code)]
pub fn create_id_token(uid: &str, email: Option<&str>, name: Option<&str>) -> String {
    sign_claims(&id_token_claims(uid, email, name))
}

#[allow(dead_code)]
pub fn admin_token() -> String {
    create_id_token("admin-uid", Some(ADMIN_EMAIL), Some("Admin"))
}

#[allow(dead_code)]
pub fn student_token() -> String {
    create_id_token("student-uid", Some("student@example.com"), Some("Student"))
}

/// Send a request and return the status and parsed JSON body
/// (`Value::Null` for an empty body).
#[allow(dead_code)]
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

/// Send a JSON body with the given method.
#[allow(dead_code)]
pub async fn send_json(app: Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

#[allow(dead_code)]
pub async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}
