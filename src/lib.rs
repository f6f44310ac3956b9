// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Tutor-Site API: server routes for an Arabic tutoring website
//!
//! This crate provides the backend API that verifies Firebase identities,
//! authorizes administrators and stores users, categories, contact
//! messages and tests in Firestore.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::DocumentStore;
use error::AppError;
use services::{AdminGuard, FirebaseAuth};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Arc<dyn DocumentStore>,
    /// `None` when Firebase is not configured (degraded mode).
    pub auth: Option<Arc<FirebaseAuth>>,
    pub admin_guard: AdminGuard,
}

impl AppState {
    /// Firebase Auth client, or `Unavailable` in degraded mode.
    pub fn auth(&self) -> Result<&FirebaseAuth, AppError> {
        self.auth.as_deref().ok_or_else(AppError::not_configured)
    }
}
