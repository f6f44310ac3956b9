// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Course category routes.

use crate::error::{AppError, Result};
use crate::models::category::MAX_CATEGORY_NAME_LEN;
use crate::models::Category;
use crate::routes::{json_body, resolve_id_token};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/categories", get(list_categories).post(create_category))
}

#[derive(Serialize, Debug, Clone)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub id: String,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Category> for CategorySummary {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.doc.name,
            created_at: format_utc_rfc3339(category.doc.created_at),
            updated_at: format_utc_rfc3339(category.doc.updated_at),
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CategoriesResponse {
    pub categories: Vec<CategorySummary>,
}

/// List all categories, ordered by name.
async fn list_categories(State(state): State<Arc<AppState>>) -> Result<Json<CategoriesResponse>> {
    let categories = state.db.list_categories().await?;

    tracing::debug!(count = categories.len(), "Listed categories");

    Ok(Json(CategoriesResponse {
        categories: categories.into_iter().map(CategorySummary::from).collect(),
    }))
}

#[derive(Deserialize)]
pub struct CreateCategoryRequest {
    #[serde(rename = "idToken", default)]
    id_token: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CreateCategoryResponse {
    pub id: String,
    pub name: String,
    pub message: String,
}

/// Trim and check a submitted category name.
fn normalize_category_name(raw: Option<&str>) -> Result<String> {
    let name = raw.map(str::trim).unwrap_or("");
    if name.is_empty() {
        return Err(AppError::BadRequest("Category name is required".to_string()));
    }
    if name.chars().count() > MAX_CATEGORY_NAME_LEN {
        return Err(AppError::BadRequest(format!(
            "Category name must be at most {} characters",
            MAX_CATEGORY_NAME_LEN
        )));
    }
    Ok(name.to_string())
}

/// Create a category (admin only). Names are unique after trimming,
/// compared case-sensitively.
async fn create_category(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: std::result::Result<Json<CreateCategoryRequest>, JsonRejection>,
) -> Result<Json<CreateCategoryResponse>> {
    let request = json_body(payload)?;
    let token = resolve_id_token(request.id_token.as_deref(), &headers);
    let admin = state.admin_guard.authorize(token).await?;

    let name = normalize_category_name(request.name.as_deref())?;

    let duplicate = || AppError::BadRequest(format!("Category '{}' already exists", name));

    // Also catches categories stored under an ID not derived from the name.
    if state.db.find_category_by_name(&name).await?.is_some() {
        return Err(duplicate());
    }

    let category = state.db.add_category(&name).await?.ok_or_else(duplicate)?;

    tracing::info!(
        admin_uid = %admin.uid,
        category_id = %category.id,
        name = %category.doc.name,
        "Category created"
    );

    Ok(Json(CreateCategoryResponse {
        id: category.id,
        name: category.doc.name,
        message: "Category created successfully".to_string(),
    }))
}
