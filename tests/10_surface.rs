mod common;

use anyhow::Result;
use reqwest::StatusCode;

#[tokio::test]
async fn root_banner_uses_success_envelope() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client.get(format!("{}/", server.base_url)).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let payload = res.json::<serde_json::Value>().await?;
    assert_eq!(payload["success"], true, "unexpected payload: {}", payload);
    assert!(payload["data"]["name"].is_string());
    assert!(payload["data"]["endpoints"].is_object());
    Ok(())
}

#[tokio::test]
async fn health_reports_ok_or_degraded_envelope() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client.get(format!("{}/health", server.base_url)).send().await?;
    let status = res.status();
    let payload = res.json::<serde_json::Value>().await?;

    match status {
        StatusCode::OK => {
            assert_eq!(payload["success"], true);
            assert_eq!(payload["data"]["status"], "ok");
        }
        StatusCode::SERVICE_UNAVAILABLE => {
            assert_eq!(payload["success"], false);
            assert_eq!(payload["data"]["status"], "degraded");
            // No connection details may leak into the envelope
            assert_eq!(payload["data"]["database"], "unreachable");
        }
        other => panic!("unexpected health status {}: {}", other, payload),
    }
    Ok(())
}

#[tokio::test]
async fn unknown_reference_kind_is_not_found() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/watchlists", server.base_url))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let payload = res.json::<serde_json::Value>().await?;
    assert_eq!(payload["success"], false);
    assert_eq!(payload["code"], "NOT_FOUND");
    Ok(())
}
