use axum::{http::HeaderMap, Json};
use serde_json::{json, Value};

use crate::auth::{self, Claims};
use crate::config;
use crate::database::models::UserSummary;
use crate::database::Database;
use crate::email::{self, EmailMessage, EmailTemplate};
use crate::error::ApiError;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::ratelimit::{self, RateDecision};
use crate::services::user_service;
use crate::validation::{Field, Format, Schema};

/// POST /auth/register - create an account and send the welcome email
pub async fn register(headers: HeaderMap, Json(payload): Json<Value>) -> ApiResult<UserSummary> {
    check_rate("register", &headers).await?;

    let valid = Schema::new()
        .field(Field::text("username").required().min_len(3).max_len(32).format(Format::Slug))
        .field(Field::text("email").required().max_len(254).format(Format::Email))
        .field(Field::text("password").required().min_len(8).max_len(128))
        .validate(&payload)?;

    let pool = Database::pool().await?;
    let user = user_service::register(
        &pool,
        valid.str("username"),
        valid.str("email"),
        valid.str("password"),
    )
    .await?;

    // Delivery failure must not fail the signup
    email::send_quietly(
        EmailMessage::new(EmailTemplate::Welcome, user.email.clone())
            .variable("username", user.username.clone()),
    )
    .await;

    Ok(ApiResponse::created(user))
}

/// POST /auth/login - verify credentials and issue a bearer token
pub async fn login(headers: HeaderMap, Json(payload): Json<Value>) -> ApiResult<Value> {
    check_rate("login", &headers).await?;

    let valid = Schema::new()
        .field(Field::text("username").required().max_len(32))
        .field(Field::text("password").required().max_len(128))
        .validate(&payload)?;

    let pool = Database::pool().await?;
    let user = user_service::authenticate(&pool, valid.str("username"), valid.str("password")).await?;

    let principal = user.principal();
    let claims = Claims::new(principal.id, principal.username.clone(), principal.roles.clone());
    let token = auth::generate_jwt(claims).map_err(|e| {
        tracing::error!("Token generation failed: {}", e);
        ApiError::internal_server_error("Failed to issue session token")
    })?;

    Ok(ApiResponse::success(json!({
        "token": token,
        "user": {
            "id": principal.id,
            "username": principal.username,
            "roles": principal.roles,
        },
        "expires_in": config::config().security.jwt_expiry_hours * 3600,
    })))
}

/// POST /auth/password/reset - request a reset token by email.
/// Responds identically whether or not the account exists.
pub async fn password_reset_request(headers: HeaderMap, Json(payload): Json<Value>) -> ApiResult<Value> {
    check_rate("password-reset", &headers).await?;

    let valid = Schema::new()
        .field(Field::text("email").required().max_len(254).format(Format::Email))
        .validate(&payload)?;

    let pool = Database::pool().await?;
    if let Some(user) = user_service::find_by_email(&pool, valid.str("email")).await? {
        if user.is_active {
            match auth::generate_reset_token(user.id) {
                Ok(token) => {
                    email::send_quietly(
                        EmailMessage::new(EmailTemplate::PasswordReset, user.email.clone())
                            .variable("username", user.username.clone())
                            .variable("reset_token", token),
                    )
                    .await;
                }
                Err(e) => tracing::error!("Reset token generation failed: {}", e),
            }
        }
    }

    Ok(ApiResponse::success(json!({
        "message": "If the account exists, a reset email has been sent"
    })))
}

/// POST /auth/password/reset/confirm - set a new password with a valid
/// reset token
pub async fn password_reset_confirm(headers: HeaderMap, Json(payload): Json<Value>) -> ApiResult<Value> {
    check_rate("password-reset", &headers).await?;

    let valid = Schema::new()
        .field(Field::text("token").required().max_len(2048))
        .field(Field::text("password").required().min_len(8).max_len(128))
        .validate(&payload)?;

    let user_id = auth::verify_reset_token(valid.str("token"))
        .map_err(|_| ApiError::unauthorized("Invalid or expired reset token"))?;

    let pool = Database::pool().await?;
    user_service::set_password(&pool, user_id, valid.str("password")).await?;

    if let Ok(user) = user_service::find_summary(&pool, user_id).await {
        email::send_quietly(
            EmailMessage::new(EmailTemplate::PasswordChanged, user.email)
                .variable("username", user.username),
        )
        .await;
    }

    Ok(ApiResponse::success(json!({ "message": "Password updated" })))
}

async fn check_rate(scope: &str, headers: &HeaderMap) -> Result<(), ApiError> {
    match ratelimit::check(scope, &client_key(headers)).await {
        RateDecision::Allow => Ok(()),
        RateDecision::Deny { retry_after_secs } => Err(ApiError::too_many_requests(
            "Too many attempts, please try again later",
            retry_after_secs,
        )),
    }
}

/// Client key for rate limiting: first forwarded address when present
fn client_key(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| "direct".to_string())
}
