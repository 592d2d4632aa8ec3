mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

// Validation happens before any storage access: each request here is
// rejected with a 400 envelope even when no database is configured.

#[tokio::test]
async fn register_with_malformed_fields_names_each_violation() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let body = json!({
        "username": "x",
        "email": "not-an-email",
        "password": "short"
    });

    let res = client
        .post(format!("{}/auth/register", server.base_url))
        .json(&body)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let payload = res.json::<serde_json::Value>().await?;
    assert_eq!(payload["success"], false);
    assert_eq!(payload["code"], "VALIDATION_ERROR");
    let field_errors = payload["field_errors"].as_object().expect("field_errors present");
    assert!(field_errors.contains_key("username"));
    assert!(field_errors.contains_key("email"));
    assert!(field_errors.contains_key("password"));
    Ok(())
}

#[tokio::test]
async fn register_with_missing_fields_is_rejected() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/auth/register", server.base_url))
        .json(&json!({}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let payload = res.json::<serde_json::Value>().await?;
    assert_eq!(payload["field_errors"]["username"], "is required");
    Ok(())
}

#[tokio::test]
async fn login_requires_both_credentials() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/auth/login", server.base_url))
        .json(&json!({ "username": "aki" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let payload = res.json::<serde_json::Value>().await?;
    assert_eq!(payload["code"], "VALIDATION_ERROR");
    assert_eq!(payload["field_errors"]["password"], "is required");
    Ok(())
}

#[tokio::test]
async fn negative_limit_is_rejected_naming_the_limit_field() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/series?limit=-5", server.base_url))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let payload = res.json::<serde_json::Value>().await?;
    assert_eq!(payload["success"], false);
    assert_eq!(payload["code"], "VALIDATION_ERROR");
    assert!(payload["field_errors"]["limit"].is_string());
    Ok(())
}

#[tokio::test]
async fn unknown_series_kind_filter_is_rejected() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/series?kind=podcast", server.base_url))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let payload = res.json::<serde_json::Value>().await?;
    assert!(payload["field_errors"]["kind"].is_string());
    Ok(())
}

#[tokio::test]
async fn reset_request_validates_email_shape() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/auth/password/reset", server.base_url))
        .json(&json!({ "email": "not an email" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let payload = res.json::<serde_json::Value>().await?;
    assert!(payload["field_errors"]["email"].is_string());
    Ok(())
}
