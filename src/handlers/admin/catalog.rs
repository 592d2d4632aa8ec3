use axum::extract::Path;
use axum::Json;
use serde_json::Value;
use uuid::Uuid;

use crate::authz::{self, Principal, ADMIN_ONLY, CATALOG_EDITORS};
use crate::database::models::RefEntity;
use crate::database::Database;
use crate::handlers::public::catalog::parse_kind;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::catalog_service;
use crate::validation::{Field, Format, Schema, Valid};

fn validate_payload(payload: &Value) -> Result<Valid, crate::validation::ValidationErrors> {
    Schema::new()
        .field(Field::text("name").required().min_len(1).max_len(100))
        .field(Field::text("slug").required().min_len(1).max_len(100).format(Format::Slug))
        .field(Field::text("description").max_len(500))
        .validate(payload)
}

/// POST /api/admin/:kind - create reference data (editor or admin)
pub async fn create(
    principal: Principal,
    Path(kind): Path<String>,
    Json(payload): Json<Value>,
) -> ApiResult<RefEntity> {
    authz::require(Some(&principal), CATALOG_EDITORS)?;
    let kind = parse_kind(&kind)?;
    let valid = validate_payload(&payload)?;

    let pool = Database::pool().await?;
    let entity = catalog_service::create(
        &pool,
        kind,
        valid.str("name"),
        valid.str("slug"),
        valid.opt_str("description"),
    )
    .await?;
    Ok(ApiResponse::created(entity))
}

/// PUT /api/admin/:kind/:id - update reference data (editor or admin)
pub async fn update(
    principal: Principal,
    Path((kind, id)): Path<(String, Uuid)>,
    Json(payload): Json<Value>,
) -> ApiResult<RefEntity> {
    authz::require(Some(&principal), CATALOG_EDITORS)?;
    let kind = parse_kind(&kind)?;
    let valid = validate_payload(&payload)?;

    let pool = Database::pool().await?;
    let entity = catalog_service::update(
        &pool,
        kind,
        id,
        valid.str("name"),
        valid.str("slug"),
        valid.opt_str("description"),
    )
    .await?;
    Ok(ApiResponse::success(entity))
}

/// DELETE /api/admin/:kind/:id - admin only
pub async fn delete(principal: Principal, Path((kind, id)): Path<(String, Uuid)>) -> ApiResult<Value> {
    authz::require(Some(&principal), ADMIN_ONLY)?;
    let kind = parse_kind(&kind)?;

    let pool = Database::pool().await?;
    catalog_service::delete(&pool, kind, id).await?;
    Ok(ApiResponse::success(serde_json::json!({ "deleted": id })))
}
