//! tests/api/health.rs
//! The liveness probe is public and wrapped like every other response.

#[path = "../common/mod.rs"]
mod common;

use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn health_is_public_and_healthy() {
    let app: common::TestApp = common::spawn_app();

    let resp: reqwest::Response = app.get("/health").send().await.expect("Failed to execute request.");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("content-type").and_then(|v| v.to_str().ok()),
        Some("application/json")
    );

    let json: Value = common::json_body(resp).await;
    assert_eq!(json["status"], "OK");
    assert_eq!(json["code"], 200);
    assert_eq!(json["data"]["status"], "healthy");
    assert_eq!(json["data"]["service"], "juno-backend");
    assert_eq!(json["data"]["message"], "Juno Backend is running!");
    assert!(json["date"].is_string());
}

#[tokio::test]
async fn health_ignores_authorization_header() {
    let app: common::TestApp = common::spawn_app();

    let resp: reqwest::Response = app
        .get("/health")
        .bearer_auth("garbage")
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(resp.status(), StatusCode::OK);
}
