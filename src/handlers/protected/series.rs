use axum::extract::Path;
use uuid::Uuid;

use crate::authz::Principal;
use crate::database::Database;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::relationship::{self, ToggleOutcome, FAVOURITES, TRACKINGS};

/// POST /api/series/:id/favourite - favourite toggle
pub async fn favourite_toggle(principal: Principal, Path(series_id): Path<Uuid>) -> ApiResult<ToggleOutcome> {
    let pool = Database::pool().await?;
    let outcome = relationship::toggle(&pool, &FAVOURITES, principal.id, series_id).await?;
    Ok(ApiResponse::success(outcome))
}

/// POST /api/series/:id/tracking - watch/read tracking toggle
pub async fn tracking_toggle(principal: Principal, Path(series_id): Path<Uuid>) -> ApiResult<ToggleOutcome> {
    let pool = Database::pool().await?;
    let outcome = relationship::toggle(&pool, &TRACKINGS, principal.id, series_id).await?;
    Ok(ApiResponse::success(outcome))
}
