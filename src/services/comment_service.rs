use sqlx::PgPool;
use uuid::Uuid;

use crate::authz::{self, Decision, Principal, Role};
use crate::database::models::Comment;
use crate::error::ApiError;
use crate::pagination::{PagedQuery, PageQuery, Paginated, Param, SortDirection};
use crate::services::series_service;

pub async fn list_for_series(
    pool: &PgPool,
    series_id: Uuid,
    page: &PageQuery,
) -> Result<Paginated<Comment>, ApiError> {
    // Surface a 404 for an unknown series instead of an empty page
    series_service::find(pool, series_id).await?;

    let query = PagedQuery::new("comments")?
        .filter_eq("series_id", Param::Uuid(series_id))?
        .order_by("created_at", SortDirection::Desc)?;
    Ok(query.fetch_paginated(pool, page).await?)
}

pub async fn create(
    pool: &PgPool,
    author: &Principal,
    series_id: Uuid,
    body: &str,
) -> Result<Comment, ApiError> {
    series_service::find(pool, series_id).await?;

    let comment = sqlx::query_as::<_, Comment>(
        "INSERT INTO comments (author_id, series_id, body) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(author.id)
    .bind(series_id)
    .bind(body)
    .fetch_one(pool)
    .await?;

    Ok(comment)
}

/// Authors may remove their own comments; moderators and admins may
/// remove any.
pub async fn delete(pool: &PgPool, principal: &Principal, comment_id: Uuid) -> Result<(), ApiError> {
    let comment = sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = $1")
        .bind(comment_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Comment not found"))?;

    let is_author = comment.author_id == principal.id;
    let is_moderator = matches!(
        authz::authorize(Some(principal), &[Role::Moderator, Role::Admin]),
        Decision::Allow
    );
    if !is_author && !is_moderator {
        return Err(ApiError::forbidden("Only the author or a moderator can remove this comment"));
    }

    sqlx::query("DELETE FROM comments WHERE id = $1")
        .bind(comment_id)
        .execute(pool)
        .await?;
    Ok(())
}
