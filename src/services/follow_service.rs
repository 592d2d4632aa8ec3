use sqlx::PgPool;
use uuid::Uuid;

use crate::authz::Principal;
use crate::database::models::{Settings, UserSummary};
use crate::error::ApiError;
use crate::pagination::{PagedQuery, PageQuery, Paginated, Param, SortDirection};
use crate::services::notification_service;
use crate::services::relationship::{self, RelationError, ToggleAction, ToggleOutcome, FOLLOWS};

/// Toggle a follow. When the toggle adds the relationship and the
/// followed user opted into follow notifications, the notification row
/// is written in the same transaction as the follow itself.
pub async fn toggle_follow(
    pool: &PgPool,
    follower: &Principal,
    followed_id: Uuid,
) -> Result<ToggleOutcome, ApiError> {
    let mut tx = pool.begin().await.map_err(RelationError::Database)?;

    let outcome = relationship::toggle_tx(&mut tx, &FOLLOWS, follower.id, followed_id).await?;

    if outcome.action == ToggleAction::Added {
        let settings = sqlx::query_as::<_, Settings>("SELECT * FROM settings WHERE user_id = $1")
            .bind(followed_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(RelationError::Database)?
            .unwrap_or_else(|| Settings::defaults(followed_id));

        if settings.notify_on_follow {
            notification_service::create_tx(
                &mut tx,
                followed_id,
                "follow",
                serde_json::json!({
                    "follower_id": follower.id,
                    "follower_username": follower.username,
                }),
            )
            .await?;
        }
    }

    tx.commit().await.map_err(RelationError::Database)?;
    Ok(outcome)
}

pub async fn followers(
    pool: &PgPool,
    user_id: Uuid,
    page: &PageQuery,
) -> Result<Paginated<UserSummary>, ApiError> {
    follow_page(pool, user_id, "followed_id", "follower_id", page).await
}

pub async fn following(
    pool: &PgPool,
    user_id: Uuid,
    page: &PageQuery,
) -> Result<Paginated<UserSummary>, ApiError> {
    follow_page(pool, user_id, "follower_id", "followed_id", page).await
}

async fn follow_page(
    pool: &PgPool,
    user_id: Uuid,
    match_col: &str,
    select_col: &str,
    page: &PageQuery,
) -> Result<Paginated<UserSummary>, ApiError> {
    // 404 for unknown accounts rather than an empty page
    crate::services::user_service::find_summary(pool, user_id).await?;

    let mut query = PagedQuery::new("users")?
        .select(crate::database::models::user::SUMMARY_COLUMNS)?
        .filter_via("id", "follows", select_col, match_col, Param::Uuid(user_id))?
        .order_by("username", SortDirection::Asc)?;
    if let Some(term) = &page.search {
        query = query.search(&["username"], term)?;
    }
    Ok(query.fetch_paginated(pool, page).await?)
}
