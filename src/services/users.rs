// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User document upsert on login.

use crate::db::DocumentStore;
use crate::error::AppError;
use crate::models::{IdentityClaims, LoginUpdate, NewUser, UserDocument};

/// Display name used when neither the caller nor the provider supplies one.
pub const FALLBACK_DISPLAY_NAME: &str = "مستخدم";

/// Pick a display name: override, then provider name, then the local part
/// of the email, then the fallback literal. Blank candidates are skipped.
pub fn resolve_display_name(claims: &IdentityClaims, override_name: Option<&str>) -> String {
    let non_blank = |s: &str| {
        let trimmed = s.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    };

    override_name
        .and_then(non_blank)
        .or_else(|| claims.name.as_deref().and_then(non_blank))
        .or_else(|| {
            claims
                .email
                .as_deref()
                .and_then(|email| email.split('@').next())
                .and_then(non_blank)
        })
        .unwrap_or_else(|| FALLBACK_DISPLAY_NAME.to_string())
}

/// Create the user's document on first login, otherwise refresh the login
/// fields. `phone`, `birthDate` and `createdAt` are never touched here.
///
/// Creation is conditional at the store, so two racing first logins for the
/// same UID cannot both create: the loser falls through to the update path.
pub async fn upsert_user(
    store: &dyn DocumentStore,
    claims: &IdentityClaims,
    override_name: Option<&str>,
) -> Result<UserDocument, AppError> {
    let name = resolve_display_name(claims, override_name);
    let email = claims.email.clone().unwrap_or_default();

    if store.get_user(&claims.uid).await?.is_none() {
        let new_user = NewUser {
            name: name.clone(),
            email: email.clone(),
            photo_url: claims.picture.clone(),
        };

        if let Some(created) = store.create_user(&claims.uid, &new_user).await? {
            tracing::info!(uid = %claims.uid, "Created user document");
            return Ok(created);
        }

        tracing::info!(uid = %claims.uid, "User document appeared concurrently, updating instead");
    }

    let update = LoginUpdate {
        name,
        email,
        photo_url: claims.picture.clone(),
    };
    let updated = store.apply_login(&claims.uid, &update).await?;

    tracing::debug!(uid = %claims.uid, "Refreshed user document on login");
    Ok(updated)
}
