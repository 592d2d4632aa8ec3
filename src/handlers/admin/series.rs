use axum::extract::Path;
use axum::Json;
use serde_json::Value;
use uuid::Uuid;

use crate::authz::{self, Principal, ADMIN_ONLY, CATALOG_EDITORS};
use crate::database::models::{series, Series};
use crate::database::Database;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::series_service::{self, SeriesInput};
use crate::validation::{Field, Format, Schema, Valid};

fn validate_payload(payload: &Value) -> Result<Valid, crate::validation::ValidationErrors> {
    Schema::new()
        .field(Field::text("title").required().min_len(1).max_len(200))
        .field(Field::text("kind").required().one_of(series::KINDS))
        .field(Field::text("status").required().one_of(series::STATUSES))
        .field(Field::text("synopsis").max_len(4000))
        .field(Field::integer("episodes").min(0).max(10_000))
        .field(Field::text_array("genre_ids").format(Format::Uuid))
        .field(Field::text_array("tag_ids").format(Format::Uuid))
        .field(Field::text_array("studio_ids").format(Format::Uuid))
        .field(Field::text_array("platform_ids").format(Format::Uuid))
        .validate(payload)
}

fn to_input(valid: &Valid) -> SeriesInput {
    let uuids = |name: &str| {
        valid
            .str_list(name)
            .iter()
            .filter_map(|s| Uuid::parse_str(s).ok())
            .collect::<Vec<_>>()
    };

    SeriesInput {
        title: valid.str("title").to_string(),
        kind: valid.str("kind").to_string(),
        status: valid.str("status").to_string(),
        synopsis: valid.opt_str("synopsis").map(str::to_string),
        episodes: valid.opt_i64("episodes").map(|e| e as i32),
        genre_ids: uuids("genre_ids"),
        tag_ids: uuids("tag_ids"),
        studio_ids: uuids("studio_ids"),
        platform_ids: uuids("platform_ids"),
    }
}

/// POST /api/admin/series - editor or admin
pub async fn create(principal: Principal, Json(payload): Json<Value>) -> ApiResult<Series> {
    authz::require(Some(&principal), CATALOG_EDITORS)?;
    let valid = validate_payload(&payload)?;

    let pool = Database::pool().await?;
    let created = series_service::create(&pool, &to_input(&valid)).await?;
    Ok(ApiResponse::created(created))
}

/// PUT /api/admin/series/:id - editor or admin
pub async fn update(
    principal: Principal,
    Path(id): Path<Uuid>,
    Json(payload): Json<Value>,
) -> ApiResult<Series> {
    authz::require(Some(&principal), CATALOG_EDITORS)?;
    let valid = validate_payload(&payload)?;

    let pool = Database::pool().await?;
    let updated = series_service::update(&pool, id, &to_input(&valid)).await?;
    Ok(ApiResponse::success(updated))
}

/// DELETE /api/admin/series/:id - admin only
pub async fn delete(principal: Principal, Path(id): Path<Uuid>) -> ApiResult<Value> {
    authz::require(Some(&principal), ADMIN_ONLY)?;

    let pool = Database::pool().await?;
    series_service::delete(&pool, id).await?;
    Ok(ApiResponse::success(serde_json::json!({ "deleted": id })))
}
