mod common;

use anyhow::Result;
use serde_json::json;

#[tokio::test]
async fn protected_routes_require_a_token() -> Result<()> {
    let router = common::offline_router();

    for (method, uri) in [
        ("GET", "/api/jobs"),
        ("GET", "/api/auth/me"),
        ("GET", "/api/preferences/theme"),
        ("PUT", "/api/preferences/theme"),
        ("GET", "/api/workers"),
        ("GET", "/api/export/jobs"),
        ("GET", "/api/config/keys"),
        ("POST", "/api/password/set"),
    ] {
        let res = common::call(&router, method, uri, None, None).await?;
        assert_eq!(res.status.as_u16(), 401, "{method} {uri} returned {}", res.status);
        assert_eq!(res.json()["error"], "No token provided", "{method} {uri}");
    }
    Ok(())
}

#[tokio::test]
async fn garbage_tokens_are_rejected() -> Result<()> {
    let router = common::offline_router();
    let res = common::call(&router, "GET", "/api/jobs", Some("not.a.jwt"), None).await?;

    assert_eq!(res.status.as_u16(), 401);
    assert_eq!(res.json()["error"], "Invalid token");
    Ok(())
}

#[tokio::test]
async fn unknown_routes_return_json_404() -> Result<()> {
    let router = common::offline_router();
    let res = common::call(&router, "GET", "/api/does-not-exist", None, None).await?;

    assert_eq!(res.status.as_u16(), 404);
    assert_eq!(res.json(), json!({ "error": "Not found" }));
    Ok(())
}

#[tokio::test]
async fn malformed_bodies_are_400_before_touching_the_database() -> Result<()> {
    let router = common::offline_router();

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{ not json"))?;
    let response = tower::ServiceExt::oneshot(router.clone(), request).await?;
    assert_eq!(response.status().as_u16(), 400);

    // Weak passwords fail validation without a database round trip
    let res = common::call(
        &router,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({ "email": "new@siteledger.test", "password": "short", "name": "New" })),
    )
    .await?;
    assert_eq!(res.status.as_u16(), 400);
    Ok(())
}

#[tokio::test]
async fn signup_rejects_bad_email() -> Result<()> {
    let router = common::offline_router();
    let res = common::call(
        &router,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({ "email": "nobody", "password": "Str0ngPass", "name": "Nobody" })),
    )
    .await?;

    assert_eq!(res.status.as_u16(), 400);
    assert_eq!(res.json()["code"], "VALIDATION_ERROR");
    Ok(())
}
