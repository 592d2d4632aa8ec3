//! CRUD over the reference-data tables (genres, tags, studios,
//! streaming platforms). The four tables share one row shape; operations
//! are parameterized by kind.

use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::RefEntity;
use crate::error::ApiError;
use crate::pagination::{PagedQuery, PageQuery, Paginated, SortDirection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Genre,
    Tag,
    Studio,
    Platform,
}

impl RefKind {
    pub fn table(&self) -> &'static str {
        match self {
            RefKind::Genre => "genres",
            RefKind::Tag => "tags",
            RefKind::Studio => "studios",
            RefKind::Platform => "platforms",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RefKind::Genre => "Genre",
            RefKind::Tag => "Tag",
            RefKind::Studio => "Studio",
            RefKind::Platform => "Platform",
        }
    }
}

pub async fn list(
    pool: &PgPool,
    kind: RefKind,
    page: &PageQuery,
) -> Result<Paginated<RefEntity>, ApiError> {
    let mut query = PagedQuery::new(kind.table())?.order_by("name", SortDirection::Asc)?;
    if let Some(term) = &page.search {
        query = query.search(&["name", "slug"], term)?;
    }
    Ok(query.fetch_paginated(pool, page).await?)
}

pub async fn create(
    pool: &PgPool,
    kind: RefKind,
    name: &str,
    slug: &str,
    description: Option<&str>,
) -> Result<RefEntity, ApiError> {
    let sql = format!(
        "INSERT INTO \"{}\" (name, slug, description) VALUES ($1, $2, $3) RETURNING *",
        kind.table()
    );
    sqlx::query_as::<_, RefEntity>(&sql)
        .bind(name)
        .bind(slug)
        .bind(description)
        .fetch_one(pool)
        .await
        .map_err(|e| classify_duplicate(kind, e))
}

pub async fn update(
    pool: &PgPool,
    kind: RefKind,
    id: Uuid,
    name: &str,
    slug: &str,
    description: Option<&str>,
) -> Result<RefEntity, ApiError> {
    let sql = format!(
        "UPDATE \"{}\" SET name = $1, slug = $2, description = $3, updated_at = now() \
         WHERE id = $4 RETURNING *",
        kind.table()
    );
    sqlx::query_as::<_, RefEntity>(&sql)
        .bind(name)
        .bind(slug)
        .bind(description)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| classify_duplicate(kind, e))?
        .ok_or_else(|| ApiError::not_found(format!("{} not found", kind.label())))
}

pub async fn delete(pool: &PgPool, kind: RefKind, id: Uuid) -> Result<(), ApiError> {
    let sql = format!("DELETE FROM \"{}\" WHERE id = $1", kind.table());
    let result = sqlx::query(&sql).bind(id).execute(pool).await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found(format!("{} not found", kind.label())));
    }
    Ok(())
}

/// Resolve a reference entity by slug (used for catalog filters)
pub async fn find_by_slug(pool: &PgPool, kind: RefKind, slug: &str) -> Result<RefEntity, ApiError> {
    let sql = format!("SELECT * FROM \"{}\" WHERE slug = $1", kind.table());
    sqlx::query_as::<_, RefEntity>(&sql)
        .bind(slug)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("{} not found", kind.label())))
}

fn classify_duplicate(kind: RefKind, err: sqlx::Error) -> ApiError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() {
            return ApiError::conflict(format!("{} with this name or slug already exists", kind.label()));
        }
    }
    err.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_their_tables() {
        assert_eq!(RefKind::Genre.table(), "genres");
        assert_eq!(RefKind::Tag.table(), "tags");
        assert_eq!(RefKind::Studio.table(), "studios");
        assert_eq!(RefKind::Platform.table(), "platforms");
    }
}
