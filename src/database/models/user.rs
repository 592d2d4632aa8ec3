use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::authz::{Principal, Role};

/// Full account row, including credential columns. Never serialized to
/// clients; handlers expose UserSummary instead.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub password_salt: String,
    pub roles: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Parse the stored role strings into the closed role set.
    /// Unknown values are skipped with a warning rather than failing the
    /// whole account.
    pub fn parsed_roles(&self) -> Vec<Role> {
        self.roles
            .iter()
            .filter_map(|raw| {
                let role = Role::parse(raw);
                if role.is_none() {
                    tracing::warn!("Skipping unknown role '{}' on user {}", raw, self.id);
                }
                role
            })
            .collect()
    }

    pub fn principal(&self) -> Principal {
        Principal {
            id: self.id,
            username: self.username.clone(),
            roles: self.parsed_roles(),
        }
    }
}

/// Client-facing account projection (no credential columns)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub roles: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Columns selected when exposing accounts to clients
pub const SUMMARY_COLUMNS: &[&str] = &["id", "username", "email", "roles", "is_active", "created_at"];

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_roles(roles: &[&str]) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            username: "rei".to_string(),
            email: "rei@example.com".to_string(),
            password_hash: String::new(),
            password_salt: String::new(),
            roles: roles.iter().map(|s| s.to_string()).collect(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn unknown_roles_are_skipped() {
        let user = user_with_roles(&["user", "superuser", "admin"]);
        assert_eq!(user.parsed_roles(), vec![Role::User, Role::Admin]);
    }
}
