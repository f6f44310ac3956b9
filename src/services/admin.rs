// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Administrator authorization.
//!
//! An identity is an administrator when its verified email is on the
//! configured allow-list. Comparison is exact and case-sensitive.

use crate::error::AppError;
use crate::models::IdentityClaims;
use crate::services::firebase_auth::FirebaseAuth;
use std::collections::HashSet;
use std::sync::Arc;

/// Verified administrator identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminPrincipal {
    pub uid: String,
    pub email: String,
}

/// Allow-list of administrator email addresses.
#[derive(Debug, Clone, Default)]
pub struct AdminPolicy {
    emails: HashSet<String>,
}

impl AdminPolicy {
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            emails: emails.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_admin(&self, email: &str) -> bool {
        self.emails.contains(email)
    }

    pub fn len(&self) -> usize {
        self.emails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }

    /// Admit verified claims whose email is on the list.
    pub fn check(&self, claims: IdentityClaims) -> Result<AdminPrincipal, AppError> {
        match claims.email {
            Some(email) if self.is_admin(&email) => Ok(AdminPrincipal {
                uid: claims.uid,
                email,
            }),
            Some(email) => {
                tracing::warn!(uid = %claims.uid, email = %email, "Non-admin attempted admin action");
                Err(AppError::Forbidden("Admin access required".to_string()))
            }
            None => {
                tracing::warn!(uid = %claims.uid, "Token without email attempted admin action");
                Err(AppError::Forbidden("Admin access required".to_string()))
            }
        }
    }
}

/// Token verification followed by the admin policy check.
#[derive(Clone)]
pub struct AdminGuard {
    auth: Option<Arc<FirebaseAuth>>,
    policy: AdminPolicy,
}

impl AdminGuard {
    pub fn new(auth: Option<Arc<FirebaseAuth>>, policy: AdminPolicy) -> Self {
        Self { auth, policy }
    }

    pub fn policy(&self) -> &AdminPolicy {
        &self.policy
    }

    /// Verify `token` and require an administrator email. No side effects.
    pub async fn authorize(&self, token: &str) -> Result<AdminPrincipal, AppError> {
        let auth = self.auth.as_deref().ok_or_else(AppError::not_configured)?;

        if token.is_empty() {
            return Err(AppError::BadRequest("idToken is required".to_string()));
        }

        let claims = auth.verify_id_token(token).await?;
        let principal = self.policy.check(claims)?;

        tracing::debug!(uid = %principal.uid, "Admin authorized");
        Ok(principal)
    }
}
