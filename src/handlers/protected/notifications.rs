use axum::extract::{Path, Query};
use axum::Json;
use serde_json::{json, Value};
use std::collections::HashMap;
use uuid::Uuid;

use crate::authz::Principal;
use crate::database::models::{Notification, Settings};
use crate::database::Database;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::pagination::{PageQuery, Paginated};
use crate::services::notification_service;
use crate::validation::{params_to_value, Field, Schema};

/// GET /api/notifications - newest first, optional unread filter
pub async fn index(
    principal: Principal,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Paginated<Notification>> {
    let page = PageQuery::from_params(&params)?;
    let valid = Schema::new()
        .field(Field::boolean("unread").default(false))
        .validate(&params_to_value(&params))?;

    let pool = Database::pool().await?;
    let result = notification_service::list(&pool, principal.id, &page, valid.bool("unread")).await?;
    Ok(ApiResponse::success(result))
}

/// PUT /api/notifications/:id/read
pub async fn mark_read(principal: Principal, Path(id): Path<Uuid>) -> ApiResult<Notification> {
    let pool = Database::pool().await?;
    let notification = notification_service::mark_read(&pool, principal.id, id).await?;
    Ok(ApiResponse::success(notification))
}

/// PUT /api/notifications/read-all
pub async fn mark_all_read(principal: Principal) -> ApiResult<Value> {
    let pool = Database::pool().await?;
    let updated = notification_service::mark_all_read(&pool, principal.id).await?;
    Ok(ApiResponse::success(json!({ "marked_read": updated })))
}

/// GET /api/settings - stored values or defaults
pub async fn get_settings(principal: Principal) -> ApiResult<Settings> {
    let pool = Database::pool().await?;
    let settings = notification_service::get_settings(&pool, principal.id).await?;
    Ok(ApiResponse::success(settings))
}

/// PUT /api/settings - partial upsert; omitted fields keep their current
/// value
pub async fn put_settings(principal: Principal, Json(payload): Json<Value>) -> ApiResult<Settings> {
    let valid = Schema::new()
        .field(Field::boolean("notify_on_follow"))
        .field(Field::boolean("notify_on_comment"))
        .field(Field::boolean("public_profile"))
        .validate(&payload)?;

    let pool = Database::pool().await?;
    let current = notification_service::get_settings(&pool, principal.id).await?;

    let settings = notification_service::upsert_settings(
        &pool,
        principal.id,
        valid.opt_bool("notify_on_follow").unwrap_or(current.notify_on_follow),
        valid.opt_bool("notify_on_comment").unwrap_or(current.notify_on_comment),
        valid.opt_bool("public_profile").unwrap_or(current.public_profile),
    )
    .await?;
    Ok(ApiResponse::success(settings))
}
