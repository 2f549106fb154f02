mod common;

use anyhow::Result;
use reqwest::StatusCode;

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client.get(format!("{}/health", server.base_url)).send().await?;

    // OK with a database, SERVICE_UNAVAILABLE without one
    assert!(
        res.status() == StatusCode::OK || res.status() == StatusCode::SERVICE_UNAVAILABLE,
        "unexpected status: {}",
        res.status()
    );

    let body = res.json::<serde_json::Value>().await?;
    assert!(body.get("status").is_some(), "missing status: {}", body);
    assert!(body.get("timestamp").is_some(), "missing timestamp: {}", body);
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    Ok(())
}

#[tokio::test]
async fn root_lists_endpoints() -> Result<()> {
    let server = common::ensure_server().await?;
    let res = reqwest::get(format!("{}/", server.base_url)).await?;

    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["name"], "SiteLedger API");
    assert_eq!(body["endpoints"]["jobs"], "/api/jobs");
    Ok(())
}

#[tokio::test]
async fn health_without_database_is_degraded() -> Result<()> {
    if common::test_database_url().is_some() {
        return Ok(());
    }
    let router = common::offline_router();
    let res = common::call(&router, "GET", "/health", None, None).await?;

    assert_eq!(res.status.as_u16(), 503);
    assert_eq!(res.json()["database"], "unavailable");
    Ok(())
}
