// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tutor-Site API Server
//!
//! Verifies Firebase identities and proxies the website's reads and writes
//! to Firestore.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tutor_site_api::{
    config::Config,
    db::{DocumentStore, FirestoreDb, MemoryStore},
    services::{AdminGuard, AdminPolicy, FirebaseAuth},
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Tutor-Site API");

    let db: Arc<dyn DocumentStore> = if config.use_memory_store {
        tracing::warn!("Using in-memory document store; data is lost on restart");
        Arc::new(MemoryStore::new())
    } else if let Some(project_id) = &config.firebase_project_id {
        Arc::new(FirestoreDb::new(project_id).await?)
    } else {
        tracing::warn!("FIREBASE_PROJECT_ID not set; document routes will answer 503");
        Arc::new(FirestoreDb::unconfigured())
    };

    let auth = match &config.firebase_project_id {
        Some(project_id) => Some(Arc::new(FirebaseAuth::new(project_id, &config)?)),
        None => {
            tracing::warn!("FIREBASE_PROJECT_ID not set; token verification will answer 503");
            None
        }
    };

    let policy = AdminPolicy::new(config.admin_emails.iter().cloned());
    if policy.is_empty() {
        tracing::warn!("ADMIN_EMAILS is empty; all admin actions will be refused");
    } else {
        tracing::info!(count = policy.len(), "Admin allow-list loaded");
    }

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        admin_guard: AdminGuard::new(auth.clone(), policy),
        auth,
    });

    // Build router
    let app = tutor_site_api::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("tutor_site_api=debug,info"));

    tracing_subscriber::registry().with(filter).with(format).init();
}
