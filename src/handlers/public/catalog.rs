use axum::extract::{Path, Query};
use std::collections::HashMap;
use uuid::Uuid;

use crate::database::models::{Comment, RefEntity, Series};
use crate::database::Database;
use crate::error::ApiError;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::pagination::{PageQuery, Paginated};
use crate::services::catalog_service::{self, RefKind};
use crate::services::comment_service;
use crate::services::series_service::{self, SeriesDetail, SeriesFilters};
use crate::validation::{params_to_value, Field, Schema};

/// GET /api/series - browse the catalog with search and filters
pub async fn series_list(Query(params): Query<HashMap<String, String>>) -> ApiResult<Paginated<Series>> {
    let page = PageQuery::from_params(&params)?;

    let valid = Schema::new()
        .field(Field::text("kind").one_of(crate::database::models::series::KINDS))
        .field(Field::text("status").one_of(crate::database::models::series::STATUSES))
        .field(Field::text("genre").min_len(1).max_len(100))
        .validate(&params_to_value(&params))?;

    let filters = SeriesFilters {
        kind: valid.opt_str("kind").map(str::to_string),
        status: valid.opt_str("status").map(str::to_string),
        genre_slug: valid.opt_str("genre").map(str::to_string),
    };

    let pool = Database::pool().await?;
    let result = series_service::list(&pool, &page, &filters).await?;
    Ok(ApiResponse::success(result))
}

/// GET /api/series/:id - one series with its linked reference data
pub async fn series_get(Path(id): Path<Uuid>) -> ApiResult<SeriesDetail> {
    let pool = Database::pool().await?;
    let detail = series_service::detail(&pool, id).await?;
    Ok(ApiResponse::success(detail))
}

/// GET /api/series/:id/comments - public comment feed, newest first
pub async fn series_comments(
    Path(id): Path<Uuid>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Paginated<Comment>> {
    let page = PageQuery::from_params(&params)?;
    let pool = Database::pool().await?;
    let result = comment_service::list_for_series(&pool, id, &page).await?;
    Ok(ApiResponse::success(result))
}

/// GET /api/:kind - reference-data listings (genres, tags, studios,
/// platforms)
pub async fn reference_list(
    Path(kind): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Paginated<RefEntity>> {
    let kind = parse_kind(&kind)?;
    let page = PageQuery::from_params(&params)?;
    let pool = Database::pool().await?;
    let result = catalog_service::list(&pool, kind, &page).await?;
    Ok(ApiResponse::success(result))
}

pub fn parse_kind(raw: &str) -> Result<RefKind, ApiError> {
    match raw {
        "genres" => Ok(RefKind::Genre),
        "tags" => Ok(RefKind::Tag),
        "studios" => Ok(RefKind::Studio),
        "platforms" => Ok(RefKind::Platform),
        _ => Err(ApiError::not_found("Unknown resource")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_segment_parses_known_tables_only() {
        assert!(parse_kind("genres").is_ok());
        assert!(parse_kind("platforms").is_ok());
        assert!(parse_kind("users").is_err());
        assert!(parse_kind("series").is_err());
    }
}
