//! tests/global_errors/500.rs
//! Ensures that an internal error maps to an HTTP 500 status without
//! leaking its details.

#[path = "../common/mod.rs"]
mod common;

use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn returns_500_on_internal_error() {
    let app: common::TestApp = common::spawn_app();
    let csrf_state: String = app.state.oauth_states.issue();

    // The stub provider fails internally on this code.
    let path: String = format!("/auth/google/callback?code={}&state={}", common::BROKEN_CODE, csrf_state);
    let resp: reqwest::Response = app.get(&path).send().await.expect("Failed to make request.");

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json: Value = common::json_body(resp).await;
    assert_eq!(json["status"], "INTERNAL_SERVER_ERROR");
    assert_eq!(json["code"], 500);
    assert_eq!(json["messages"][0], "Internal server error");
}
