use serde::Serialize;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::database::models::{RefEntity, Series};
use crate::error::ApiError;
use crate::pagination::{PagedQuery, PageQuery, Paginated, Param, SortDirection};
use crate::services::catalog_service::{self, RefKind};

/// Catalog listing filters, resolved from validated query input
#[derive(Debug, Default)]
pub struct SeriesFilters {
    pub kind: Option<String>,
    pub status: Option<String>,
    pub genre_slug: Option<String>,
}

/// Write-side input; validation happened at the handler boundary
#[derive(Debug)]
pub struct SeriesInput {
    pub title: String,
    pub kind: String,
    pub status: String,
    pub synopsis: Option<String>,
    pub episodes: Option<i32>,
    pub genre_ids: Vec<Uuid>,
    pub tag_ids: Vec<Uuid>,
    pub studio_ids: Vec<Uuid>,
    pub platform_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct SeriesDetail {
    #[serde(flatten)]
    pub series: Series,
    pub genres: Vec<RefEntity>,
    pub tags: Vec<RefEntity>,
    pub studios: Vec<RefEntity>,
    pub platforms: Vec<RefEntity>,
}

pub async fn list(
    pool: &PgPool,
    page: &PageQuery,
    filters: &SeriesFilters,
) -> Result<Paginated<Series>, ApiError> {
    let mut query = PagedQuery::new("series")?.order_by("title", SortDirection::Asc)?;

    if let Some(term) = &page.search {
        query = query.search(&["title"], term)?;
    }
    if let Some(kind) = &filters.kind {
        query = query.filter_eq("kind", Param::Text(kind.clone()))?;
    }
    if let Some(status) = &filters.status {
        query = query.filter_eq("status", Param::Text(status.clone()))?;
    }
    if let Some(slug) = &filters.genre_slug {
        let genre = catalog_service::find_by_slug(pool, RefKind::Genre, slug).await?;
        query = query.filter_via("id", "series_genres", "series_id", "genre_id", Param::Uuid(genre.id))?;
    }

    Ok(query.fetch_paginated(pool, page).await?)
}

pub async fn find(pool: &PgPool, id: Uuid) -> Result<Series, ApiError> {
    sqlx::query_as::<_, Series>("SELECT * FROM series WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Series not found"))
}

pub async fn detail(pool: &PgPool, id: Uuid) -> Result<SeriesDetail, ApiError> {
    let series = find(pool, id).await?;
    Ok(SeriesDetail {
        genres: linked(pool, id, "genres", "series_genres", "genre_id").await?,
        tags: linked(pool, id, "tags", "series_tags", "tag_id").await?,
        studios: linked(pool, id, "studios", "series_studios", "studio_id").await?,
        platforms: linked(pool, id, "platforms", "series_platforms", "platform_id").await?,
        series,
    })
}

async fn linked(
    pool: &PgPool,
    series_id: Uuid,
    ref_table: &str,
    join_table: &str,
    ref_col: &str,
) -> Result<Vec<RefEntity>, ApiError> {
    let sql = format!(
        "SELECT r.* FROM \"{ref_table}\" r \
         JOIN \"{join_table}\" j ON j.\"{ref_col}\" = r.id \
         WHERE j.series_id = $1 ORDER BY r.name ASC",
    );
    Ok(sqlx::query_as::<_, RefEntity>(&sql).bind(series_id).fetch_all(pool).await?)
}

pub async fn create(pool: &PgPool, input: &SeriesInput) -> Result<Series, ApiError> {
    let mut tx = pool.begin().await?;

    let series = sqlx::query_as::<_, Series>(
        "INSERT INTO series (title, kind, status, synopsis, episodes) \
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(&input.title)
    .bind(&input.kind)
    .bind(&input.status)
    .bind(&input.synopsis)
    .bind(input.episodes)
    .fetch_one(&mut *tx)
    .await?;

    replace_all_links(&mut tx, series.id, input).await?;

    tx.commit().await?;
    Ok(series)
}

pub async fn update(pool: &PgPool, id: Uuid, input: &SeriesInput) -> Result<Series, ApiError> {
    let mut tx = pool.begin().await?;

    let series = sqlx::query_as::<_, Series>(
        "UPDATE series SET title = $1, kind = $2, status = $3, synopsis = $4, episodes = $5, \
         updated_at = now() WHERE id = $6 RETURNING *",
    )
    .bind(&input.title)
    .bind(&input.kind)
    .bind(&input.status)
    .bind(&input.synopsis)
    .bind(input.episodes)
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::not_found("Series not found"))?;

    replace_all_links(&mut tx, series.id, input).await?;

    tx.commit().await?;
    Ok(series)
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), ApiError> {
    let result = sqlx::query("DELETE FROM series WHERE id = $1").bind(id).execute(pool).await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Series not found"));
    }
    Ok(())
}

async fn replace_all_links(
    tx: &mut Transaction<'_, Postgres>,
    series_id: Uuid,
    input: &SeriesInput,
) -> Result<(), ApiError> {
    replace_links(tx, series_id, "series_genres", "genre_id", &input.genre_ids).await?;
    replace_links(tx, series_id, "series_tags", "tag_id", &input.tag_ids).await?;
    replace_links(tx, series_id, "series_studios", "studio_id", &input.studio_ids).await?;
    replace_links(tx, series_id, "series_platforms", "platform_id", &input.platform_ids).await?;
    Ok(())
}

/// Replace a series' rows in one link table. Foreign-key integrity turns
/// an unknown reference id into a not-found outcome for the whole write.
async fn replace_links(
    tx: &mut Transaction<'_, Postgres>,
    series_id: Uuid,
    join_table: &str,
    ref_col: &str,
    ids: &[Uuid],
) -> Result<(), ApiError> {
    let delete = format!("DELETE FROM \"{}\" WHERE series_id = $1", join_table);
    sqlx::query(&delete).bind(series_id).execute(&mut **tx).await?;

    let insert = format!(
        "INSERT INTO \"{}\" (series_id, \"{}\") VALUES ($1, $2) ON CONFLICT DO NOTHING",
        join_table, ref_col
    );
    for ref_id in ids {
        sqlx::query(&insert)
            .bind(series_id)
            .bind(ref_id)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}
