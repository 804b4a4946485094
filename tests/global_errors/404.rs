//! tests/global_errors/404.rs
//! Ensures that unknown routes and unregistered methods return HTTP 404.

// Include the helper module defined in tests/common/mod.rs.
#[path = "../common/mod.rs"]
mod common;

use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn returns_404_for_nonexistent_route() {
    let app: common::TestApp = common::spawn_app();

    // Send a GET request to a route that does not exist.
    let resp: reqwest::Response = app
        .get("/does-not-exist")
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // Assert the JSON has the expected structure.
    let json: Value = common::json_body(resp).await;
    assert_eq!(json["status"], "NOT_FOUND");
    assert_eq!(json["code"], 404);
    assert_eq!(json["data"]["error"], "not_found");
}

#[tokio::test]
async fn returns_404_for_unregistered_method_on_public_path() {
    let app: common::TestApp = common::spawn_app();

    let resp: reqwest::Response = app
        .client
        .patch(app.url("/health"))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let json: Value = common::json_body(resp).await;
    assert_eq!(json["code"], 404);
}

#[tokio::test]
async fn returns_404_for_unregistered_method_on_protected_path() {
    let app: common::TestApp = common::spawn_app();
    let (_, token) = app.seed_user("Method Tester", None).await;

    // /api/profile only knows GET and PUT
    let resp: reqwest::Response = app
        .delete("/api/profile")
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
