mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;
use uuid::Uuid;

use anitomo_api::auth::{generate_jwt, Claims};
use anitomo_api::authz::Role;

// The gate denies before any storage access: every request here settles
// at the authentication/authorization layer, so the assertions hold even
// when no database is configured.

fn token_with_roles(roles: Vec<Role>) -> String {
    let claims = Claims::new(Uuid::new_v4(), "testuser".to_string(), roles);
    generate_jwt(claims).expect("token generation (shared dev secret)")
}

#[tokio::test]
async fn protected_routes_require_a_session() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    for path in ["/api/auth/whoami", "/api/notifications", "/api/lists", "/api/settings"] {
        let res = client.get(format!("{}{}", server.base_url, path)).send().await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "path {}", path);

        let payload = res.json::<serde_json::Value>().await?;
        assert_eq!(payload["success"], false);
        assert_eq!(payload["code"], "UNAUTHORIZED");
    }
    Ok(())
}

#[tokio::test]
async fn malformed_bearer_tokens_are_a_normal_401() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/auth/whoami", server.base_url))
        .header("Authorization", "Bearer not-a-real-token")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .get(format!("{}/api/auth/whoami", server.base_url))
        .header("Authorization", "Basic dXNlcjpwYXNz")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn admin_surface_denies_unauthenticated_access() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/admin/users", server.base_url))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let payload = res.json::<serde_json::Value>().await?;
    assert_eq!(payload["code"], "UNAUTHORIZED");
    Ok(())
}

#[tokio::test]
async fn plain_users_are_denied_the_staff_surface() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let token = token_with_roles(vec![Role::User]);

    // The router-level gate denies before the handler ever runs
    let res = client
        .get(format!("{}/api/admin/users", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let payload = res.json::<serde_json::Value>().await?;
    assert_eq!(payload["success"], false);
    assert_eq!(payload["code"], "FORBIDDEN");
    Ok(())
}

#[tokio::test]
async fn editors_reach_the_staff_surface_but_not_admin_operations() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let token = token_with_roles(vec![Role::User, Role::Editor]);

    // Past the coarse staff gate, the per-operation role set still
    // denies: deleting reference data is admin-only
    let res = client
        .delete(format!("{}/api/admin/genres/{}", server.base_url, Uuid::new_v4()))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Account listing is moderator/admin, not editor
    let res = client
        .get(format!("{}/api/admin/users", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn editor_catalog_writes_still_validate_before_storage() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let token = token_with_roles(vec![Role::Editor]);

    // Role gate passes, then validation rejects the payload before any
    // query executes
    let res = client
        .post(format!("{}/api/admin/genres", server.base_url))
        .bearer_auth(&token)
        .json(&json!({ "name": "Action", "slug": "Not A Slug" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let payload = res.json::<serde_json::Value>().await?;
    assert_eq!(payload["code"], "VALIDATION_ERROR");
    assert!(payload["field_errors"]["slug"].is_string());
    Ok(())
}

#[tokio::test]
async fn anonymous_comment_posting_is_denied_on_the_mixed_route() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    // GET on the same path is public; POST requires a session
    let res = client
        .post(format!("{}/api/series/{}/comments", server.base_url, Uuid::new_v4()))
        .json(&json!({ "body": "great show" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}
