use axum::extract::Path;
use axum::Json;
use serde_json::Value;
use uuid::Uuid;

use crate::authz::Principal;
use crate::config;
use crate::database::models::Comment;
use crate::database::Database;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::comment_service;
use crate::validation::{Field, Schema};

/// POST /api/series/:id/comments
pub async fn create(
    principal: Principal,
    Path(series_id): Path<Uuid>,
    Json(payload): Json<Value>,
) -> ApiResult<Comment> {
    let max_len = config::config().api.max_comment_length;
    let valid = Schema::new()
        .field(Field::text("body").required().min_len(1).max_len(max_len))
        .validate(&payload)?;

    let pool = Database::pool().await?;
    let comment = comment_service::create(&pool, &principal, series_id, valid.str("body")).await?;
    Ok(ApiResponse::created(comment))
}

/// DELETE /api/comments/:id - author, moderator, or admin
pub async fn delete(principal: Principal, Path(comment_id): Path<Uuid>) -> ApiResult<Value> {
    let pool = Database::pool().await?;
    comment_service::delete(&pool, &principal, comment_id).await?;
    Ok(ApiResponse::success(serde_json::json!({ "deleted": comment_id })))
}
