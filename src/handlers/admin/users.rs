use axum::extract::{Path, Query};
use axum::Json;
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

use crate::authz::{self, Principal, Role, ADMIN_ONLY, MODERATORS};
use crate::database::models::user::SUMMARY_COLUMNS;
use crate::database::models::UserSummary;
use crate::database::Database;
use crate::error::ApiError;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::pagination::{PagedQuery, PageQuery, Paginated, SortDirection};
use crate::services::user_service;
use crate::validation::{Field, Schema};

const ROLE_NAMES: &[&str] = &["user", "editor", "moderator", "admin"];

/// GET /api/admin/users - account listing with search (moderator or
/// admin)
pub async fn index(
    principal: Principal,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Paginated<UserSummary>> {
    authz::require(Some(&principal), MODERATORS)?;
    let page = PageQuery::from_params(&params)?;

    let pool = Database::pool().await?;
    let mut query = PagedQuery::new("users")?
        .select(SUMMARY_COLUMNS)?
        .order_by("username", SortDirection::Asc)?;
    if let Some(term) = &page.search {
        query = query.search(&["username", "email"], term)?;
    }

    let result = query.fetch_paginated(&pool, &page).await?;
    Ok(ApiResponse::success(result))
}

/// PUT /api/admin/users/:id/roles - replace the role set (admin only)
pub async fn set_roles(
    principal: Principal,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<Value>,
) -> ApiResult<UserSummary> {
    authz::require(Some(&principal), ADMIN_ONLY)?;

    let valid = Schema::new()
        .field(Field::text_array("roles").required().one_of(ROLE_NAMES))
        .validate(&payload)?;

    let roles: Vec<Role> = valid
        .str_list("roles")
        .iter()
        .filter_map(|s| Role::parse(s))
        .collect();
    if roles.is_empty() {
        return Err(ApiError::validation_error(
            "Invalid request data",
            Some(HashMap::from([(
                "roles".to_string(),
                "must contain at least one role".to_string(),
            )])),
        ));
    }

    let pool = Database::pool().await?;
    let user = user_service::set_roles(&pool, user_id, &roles).await?;
    Ok(ApiResponse::success(user))
}

/// PUT /api/admin/users/:id/deactivate - admin only; accounts are never
/// deleted
pub async fn deactivate(principal: Principal, Path(user_id): Path<Uuid>) -> ApiResult<UserSummary> {
    authz::require(Some(&principal), ADMIN_ONLY)?;

    let pool = Database::pool().await?;
    let user = user_service::deactivate(&pool, user_id).await?;
    Ok(ApiResponse::success(user))
}
