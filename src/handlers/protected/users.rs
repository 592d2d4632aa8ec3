use axum::extract::{Path, Query};
use std::collections::HashMap;
use uuid::Uuid;

use crate::authz::Principal;
use crate::database::models::UserSummary;
use crate::database::Database;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::pagination::{PageQuery, Paginated};
use crate::services::follow_service;
use crate::services::relationship::ToggleOutcome;

/// POST /api/users/:id/follow - follow toggle. Self-follow is rejected
/// before the engine runs; following a user notifies them in the same
/// transaction as the follow row.
pub async fn follow_toggle(principal: Principal, Path(user_id): Path<Uuid>) -> ApiResult<ToggleOutcome> {
    let pool = Database::pool().await?;
    let outcome = follow_service::toggle_follow(&pool, &principal, user_id).await?;
    Ok(ApiResponse::success(outcome))
}

/// GET /api/users/:id/followers
pub async fn followers(
    Path(user_id): Path<Uuid>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Paginated<UserSummary>> {
    let page = PageQuery::from_params(&params)?;
    let pool = Database::pool().await?;
    let result = follow_service::followers(&pool, user_id, &page).await?;
    Ok(ApiResponse::success(result))
}

/// GET /api/users/:id/following
pub async fn following(
    Path(user_id): Path<Uuid>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Paginated<UserSummary>> {
    let page = PageQuery::from_params(&params)?;
    let pool = Database::pool().await?;
    let result = follow_service::following(&pool, user_id, &page).await?;
    Ok(ApiResponse::success(result))
}
