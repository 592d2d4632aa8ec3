use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::database::models::{Notification, Settings};
use crate::error::ApiError;
use crate::pagination::{PagedQuery, PageQuery, Paginated, Param, SortDirection};
use crate::services::relationship::RelationError;

/// Insert a notification inside a caller-owned transaction, so the
/// notification commits or rolls back together with the write that
/// produced it.
pub async fn create_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    kind: &str,
    payload: serde_json::Value,
) -> Result<Notification, RelationError> {
    let notification = sqlx::query_as::<_, Notification>(
        "INSERT INTO notifications (user_id, kind, payload) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(user_id)
    .bind(kind)
    .bind(payload)
    .fetch_one(&mut **tx)
    .await?;

    Ok(notification)
}

pub async fn list(
    pool: &PgPool,
    user_id: Uuid,
    page: &PageQuery,
    unread_only: bool,
) -> Result<Paginated<Notification>, ApiError> {
    let mut query = PagedQuery::new("notifications")?
        .filter_eq("user_id", Param::Uuid(user_id))?
        .order_by("created_at", SortDirection::Desc)?;
    if unread_only {
        query = query.filter_null("read_at", true)?;
    }
    Ok(query.fetch_paginated(pool, page).await?)
}

/// Mark one notification read. Scoped to the owner: someone else's
/// notification id resolves as not-found.
pub async fn mark_read(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<Notification, ApiError> {
    sqlx::query_as::<_, Notification>(
        "UPDATE notifications SET read_at = COALESCE(read_at, now()) \
         WHERE id = $1 AND user_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Notification not found"))
}

pub async fn mark_all_read(pool: &PgPool, user_id: Uuid) -> Result<u64, ApiError> {
    let result = sqlx::query(
        "UPDATE notifications SET read_at = now() WHERE user_id = $1 AND read_at IS NULL",
    )
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Per-user preferences; accounts that never saved settings read as the
/// defaults
pub async fn get_settings(pool: &PgPool, user_id: Uuid) -> Result<Settings, ApiError> {
    let settings = sqlx::query_as::<_, Settings>("SELECT * FROM settings WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .unwrap_or_else(|| Settings::defaults(user_id));
    Ok(settings)
}

pub async fn upsert_settings(
    pool: &PgPool,
    user_id: Uuid,
    notify_on_follow: bool,
    notify_on_comment: bool,
    public_profile: bool,
) -> Result<Settings, ApiError> {
    let settings = sqlx::query_as::<_, Settings>(
        "INSERT INTO settings (user_id, notify_on_follow, notify_on_comment, public_profile) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (user_id) DO UPDATE SET \
            notify_on_follow = EXCLUDED.notify_on_follow, \
            notify_on_comment = EXCLUDED.notify_on_comment, \
            public_profile = EXCLUDED.public_profile, \
            updated_at = now() \
         RETURNING *",
    )
    .bind(user_id)
    .bind(notify_on_follow)
    .bind(notify_on_comment)
    .bind(public_profile)
    .fetch_one(pool)
    .await?;

    Ok(settings)
}
