use axum::Json;
use serde_json::{json, Value};

use crate::authz::Principal;
use crate::database::models::UserSummary;
use crate::database::Database;
use crate::email::{self, EmailMessage, EmailTemplate};
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::user_service;
use crate::validation::{Field, Schema};

/// GET /api/auth/whoami - the acting account
pub async fn whoami(principal: Principal) -> ApiResult<UserSummary> {
    let pool = Database::pool().await?;
    let user = user_service::find_summary(&pool, principal.id).await?;
    Ok(ApiResponse::success(user))
}

/// PUT /api/auth/password - change password, notifying by email.
/// The change succeeds even if the notification email fails.
pub async fn change_password(principal: Principal, Json(payload): Json<Value>) -> ApiResult<Value> {
    let valid = Schema::new()
        .field(Field::text("current_password").required().max_len(128))
        .field(Field::text("new_password").required().min_len(8).max_len(128))
        .validate(&payload)?;

    let pool = Database::pool().await?;
    let user = user_service::change_password(
        &pool,
        principal.id,
        valid.str("current_password"),
        valid.str("new_password"),
    )
    .await?;

    email::send_quietly(
        EmailMessage::new(EmailTemplate::PasswordChanged, user.email)
            .variable("username", user.username),
    )
    .await;

    Ok(ApiResponse::success(json!({ "message": "Password updated" })))
}
