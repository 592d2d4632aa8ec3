use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::password;
use crate::authz::Role;
use crate::database::models::{User, UserSummary};

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("username already taken")]
    DuplicateUsername,
    #[error("email already registered")]
    DuplicateEmail,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("account deactivated")]
    Inactive,
    #[error("user not found")]
    NotFound,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

const SUMMARY_RETURNING: &str = "id, username, email, roles, is_active, created_at";

/// Create an account with the default role set. The unique indexes on
/// username and email are the duplicate authority; violations map to
/// conflict outcomes instead of surfacing raw constraint errors.
pub async fn register(
    pool: &PgPool,
    username: &str,
    email: &str,
    plaintext_password: &str,
) -> Result<UserSummary, UserError> {
    let salt = password::new_salt();
    let hash = password::digest(&salt, plaintext_password);

    let sql = format!(
        "INSERT INTO users (username, email, password_hash, password_salt) \
         VALUES ($1, $2, $3, $4) RETURNING {}",
        SUMMARY_RETURNING
    );

    sqlx::query_as::<_, UserSummary>(&sql)
        .bind(username)
        .bind(email)
        .bind(&hash)
        .bind(&salt)
        .fetch_one(pool)
        .await
        .map_err(classify_duplicate)
}

fn classify_duplicate(err: sqlx::Error) -> UserError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() {
            return match db_err.constraint() {
                Some(name) if name.contains("email") => UserError::DuplicateEmail,
                _ => UserError::DuplicateUsername,
            };
        }
    }
    UserError::Database(err)
}

/// Verify credentials for login. Unknown usernames and wrong passwords
/// report identically; deactivated accounts are a distinct outcome.
pub async fn authenticate(
    pool: &PgPool,
    username: &str,
    plaintext_password: &str,
) -> Result<User, UserError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await?
        .ok_or(UserError::InvalidCredentials)?;

    if !password::verify(&user.password_salt, plaintext_password, &user.password_hash) {
        return Err(UserError::InvalidCredentials);
    }

    if !user.is_active {
        return Err(UserError::Inactive);
    }

    Ok(user)
}

pub async fn find(pool: &PgPool, user_id: Uuid) -> Result<Option<User>, UserError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, UserError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

pub async fn find_summary(pool: &PgPool, user_id: Uuid) -> Result<UserSummary, UserError> {
    let sql = format!("SELECT {} FROM users WHERE id = $1", SUMMARY_RETURNING);
    sqlx::query_as::<_, UserSummary>(&sql)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or(UserError::NotFound)
}

/// Change password after re-verifying the current one
pub async fn change_password(
    pool: &PgPool,
    user_id: Uuid,
    current_password: &str,
    new_password: &str,
) -> Result<User, UserError> {
    let user = find(pool, user_id).await?.ok_or(UserError::NotFound)?;

    if !password::verify(&user.password_salt, current_password, &user.password_hash) {
        return Err(UserError::InvalidCredentials);
    }

    set_password(pool, user_id, new_password).await?;
    Ok(user)
}

/// Overwrite credentials without the current-password check; callers
/// hold a verified reset token
pub async fn set_password(pool: &PgPool, user_id: Uuid, new_password: &str) -> Result<(), UserError> {
    let salt = password::new_salt();
    let hash = password::digest(&salt, new_password);

    let result = sqlx::query(
        "UPDATE users SET password_hash = $1, password_salt = $2, updated_at = now() WHERE id = $3",
    )
    .bind(&hash)
    .bind(&salt)
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(UserError::NotFound);
    }
    Ok(())
}

/// Replace the role set (admin operation; input already validated
/// against the closed role list)
pub async fn set_roles(pool: &PgPool, user_id: Uuid, roles: &[Role]) -> Result<UserSummary, UserError> {
    let role_strings: Vec<String> = roles.iter().map(|r| r.as_str().to_string()).collect();

    let sql = format!(
        "UPDATE users SET roles = $1, updated_at = now() WHERE id = $2 RETURNING {}",
        SUMMARY_RETURNING
    );

    sqlx::query_as::<_, UserSummary>(&sql)
        .bind(&role_strings)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or(UserError::NotFound)
}

/// Accounts are deactivated, never deleted
pub async fn deactivate(pool: &PgPool, user_id: Uuid) -> Result<UserSummary, UserError> {
    let sql = format!(
        "UPDATE users SET is_active = FALSE, updated_at = now() WHERE id = $1 RETURNING {}",
        SUMMARY_RETURNING
    );

    sqlx::query_as::<_, UserSummary>(&sql)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or(UserError::NotFound)
}
