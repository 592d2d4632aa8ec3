use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::authz::{self, Decision, Principal, Role};
use crate::database::models::{List, Series};
use crate::error::ApiError;
use crate::pagination::{PagedQuery, PageQuery, Paginated, Param, SortDirection};
use crate::services::relationship::{self, ToggleOutcome, LIST_ENTRIES};

#[derive(Debug, Serialize)]
pub struct ListDetail {
    #[serde(flatten)]
    pub list: List,
    pub entries: Paginated<Series>,
}

pub async fn create(
    pool: &PgPool,
    owner: &Principal,
    name: &str,
    description: Option<&str>,
    is_public: bool,
) -> Result<List, ApiError> {
    let list = sqlx::query_as::<_, List>(
        "INSERT INTO lists (owner_id, name, description, is_public) \
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(owner.id)
    .bind(name)
    .bind(description)
    .bind(is_public)
    .fetch_one(pool)
    .await?;

    Ok(list)
}

/// The caller's own lists, public and private
pub async fn list_for_owner(
    pool: &PgPool,
    owner: &Principal,
    page: &PageQuery,
) -> Result<Paginated<List>, ApiError> {
    let mut query = PagedQuery::new("lists")?
        .filter_eq("owner_id", Param::Uuid(owner.id))?
        .order_by("name", SortDirection::Asc)?;
    if let Some(term) = &page.search {
        query = query.search(&["name"], term)?;
    }
    Ok(query.fetch_paginated(pool, page).await?)
}

/// Fetch a list plus a page of its entries. Private lists resolve as
/// not-found for everyone but their owner and moderators, so their
/// existence is not leaked.
pub async fn detail(
    pool: &PgPool,
    principal: Option<&Principal>,
    list_id: Uuid,
    page: &PageQuery,
) -> Result<ListDetail, ApiError> {
    let list = find(pool, list_id).await?;

    if !list.is_public && !can_manage(principal, &list) {
        return Err(ApiError::not_found("List not found"));
    }

    let entries = PagedQuery::new("series")?
        .filter_via("id", "list_entries", "series_id", "list_id", Param::Uuid(list.id))?
        .order_by("title", SortDirection::Asc)?
        .fetch_paginated(pool, page)
        .await?;

    Ok(ListDetail { list, entries })
}

pub async fn delete(pool: &PgPool, principal: &Principal, list_id: Uuid) -> Result<(), ApiError> {
    let list = find(pool, list_id).await?;

    if !can_manage(Some(principal), &list) {
        return Err(ApiError::forbidden("Only the owner or a moderator can delete this list"));
    }

    sqlx::query("DELETE FROM lists WHERE id = $1")
        .bind(list_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Toggle a series in or out of a list (owner only)
pub async fn toggle_entry(
    pool: &PgPool,
    principal: &Principal,
    list_id: Uuid,
    series_id: Uuid,
) -> Result<ToggleOutcome, ApiError> {
    let list = find(pool, list_id).await?;

    if list.owner_id != principal.id {
        return Err(ApiError::forbidden("Only the owner can edit list entries"));
    }

    Ok(relationship::toggle(pool, &LIST_ENTRIES, list.id, series_id).await?)
}

async fn find(pool: &PgPool, list_id: Uuid) -> Result<List, ApiError> {
    sqlx::query_as::<_, List>("SELECT * FROM lists WHERE id = $1")
        .bind(list_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("List not found"))
}

fn can_manage(principal: Option<&Principal>, list: &List) -> bool {
    match principal {
        Some(p) if p.id == list.owner_id => true,
        Some(p) => matches!(
            authz::authorize(Some(p), &[Role::Moderator, Role::Admin]),
            Decision::Allow
        ),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn list_owned_by(owner_id: Uuid, is_public: bool) -> List {
        let now = Utc::now();
        List {
            id: Uuid::new_v4(),
            owner_id,
            name: "Winter favourites".to_string(),
            description: None,
            is_public,
            created_at: now,
            updated_at: now,
        }
    }

    fn principal(id: Uuid, roles: &[Role]) -> Principal {
        Principal { id, username: "aoi".to_string(), roles: roles.to_vec() }
    }

    #[test]
    fn owners_and_moderators_manage_private_lists() {
        let owner_id = Uuid::new_v4();
        let list = list_owned_by(owner_id, false);

        assert!(can_manage(Some(&principal(owner_id, &[Role::User])), &list));
        assert!(can_manage(Some(&principal(Uuid::new_v4(), &[Role::Moderator])), &list));
        assert!(!can_manage(Some(&principal(Uuid::new_v4(), &[Role::User])), &list));
        assert!(!can_manage(None, &list));
    }
}
