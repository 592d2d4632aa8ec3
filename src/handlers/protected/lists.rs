use axum::extract::{Path, Query};
use axum::Json;
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

use crate::authz::Principal;
use crate::database::models::List;
use crate::database::Database;
use crate::middleware::auth::MaybePrincipal;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::pagination::{PageQuery, Paginated};
use crate::services::list_service::{self, ListDetail};
use crate::services::relationship::ToggleOutcome;
use crate::validation::{Field, Schema};

/// GET /api/lists - the caller's own lists
pub async fn index(
    principal: Principal,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Paginated<List>> {
    let page = PageQuery::from_params(&params)?;
    let pool = Database::pool().await?;
    let result = list_service::list_for_owner(&pool, &principal, &page).await?;
    Ok(ApiResponse::success(result))
}

/// POST /api/lists
pub async fn create(principal: Principal, Json(payload): Json<Value>) -> ApiResult<List> {
    let valid = Schema::new()
        .field(Field::text("name").required().min_len(1).max_len(100))
        .field(Field::text("description").max_len(500))
        .field(Field::boolean("is_public").default(true))
        .validate(&payload)?;

    let pool = Database::pool().await?;
    let list = list_service::create(
        &pool,
        &principal,
        valid.str("name"),
        valid.opt_str("description"),
        valid.bool("is_public"),
    )
    .await?;
    Ok(ApiResponse::created(list))
}

/// GET /api/lists/:id - list with a page of entries. Mounted with the
/// optional session resolver: public lists render anonymously, private
/// lists resolve as not-found for anyone but their owner or a moderator.
pub async fn detail(
    MaybePrincipal(principal): MaybePrincipal,
    Path(list_id): Path<Uuid>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<ListDetail> {
    let page = PageQuery::from_params(&params)?;
    let pool = Database::pool().await?;
    let result = list_service::detail(&pool, principal.as_ref(), list_id, &page).await?;
    Ok(ApiResponse::success(result))
}

/// DELETE /api/lists/:id - owner or moderator
pub async fn delete(principal: Principal, Path(list_id): Path<Uuid>) -> ApiResult<Value> {
    let pool = Database::pool().await?;
    list_service::delete(&pool, &principal, list_id).await?;
    Ok(ApiResponse::success(serde_json::json!({ "deleted": list_id })))
}

/// POST /api/lists/:id/entries/:series_id - membership toggle
pub async fn entry_toggle(
    principal: Principal,
    Path((list_id, series_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<ToggleOutcome> {
    let pool = Database::pool().await?;
    let outcome = list_service::toggle_entry(&pool, &principal, list_id, series_id).await?;
    Ok(ApiResponse::success(outcome))
}
