use anyhow::{bail, Context};

use crate::authz::Role;
use crate::database::Database;
use crate::services::user_service;

pub async fn create_user(username: &str, email: &str, password: &str, roles: &str) -> anyhow::Result<()> {
    let parsed_roles: Vec<Role> = roles
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|raw| Role::parse(raw).with_context(|| format!("unknown role '{}'", raw)))
        .collect::<anyhow::Result<_>>()?;

    if parsed_roles.is_empty() {
        bail!("at least one role is required");
    }

    let pool = Database::pool().await?;
    let user = user_service::register(&pool, username, email, password)
        .await
        .context("failed to create user")?;

    // register() grants the default role; elevate if more was requested
    let user = if parsed_roles != vec![Role::User] {
        user_service::set_roles(&pool, user.id, &parsed_roles)
            .await
            .context("failed to assign roles")?
    } else {
        user
    };

    println!("Created user {} ({}) with roles [{}]", user.username, user.id, user.roles.join(", "));
    Ok(())
}
