// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod admin;
pub mod firebase_auth;
pub mod users;

pub use admin::{AdminGuard, AdminPolicy, AdminPrincipal};
pub use firebase_auth::{AuthError, FirebaseAuth, PasswordSignIn, UserRecord};
pub use users::{resolve_display_name, upsert_user};
