//! tests/api/profile.rs
//! Reading and updating the caller's profile.

#[path = "../common/mod.rs"]
mod common;

use reqwest::{Response, StatusCode};
use serde_json::{json, Value};

#[tokio::test]
async fn profile_update_roundtrip() {
    let app: common::TestApp = common::spawn_app();
    let (user, token) = app.seed_user("Bob Builder", None).await;

    let resp: Response = app
        .put("/api/profile")
        .bearer_auth(&token)
        .json(&json!({ "username": "Bob_B", "bio": "  Weekend driver  " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json: Value = common::json_body(resp).await;
    assert_eq!(json["data"]["username"], "bob_b");
    assert_eq!(json["data"]["bio"], "Weekend driver");
    assert_eq!(json["messages"][0], "Profile updated successfully");

    let fetched: Value = common::json_body(
        app.get("/api/profile").bearer_auth(&token).send().await.unwrap(),
    )
    .await;
    assert_eq!(fetched["data"]["id"], user.id.to_string());
    assert_eq!(fetched["data"]["name"], "Bob Builder");
    assert_eq!(fetched["data"]["username"], "bob_b");
}

#[tokio::test]
async fn invalid_profile_updates_are_rejected() {
    let app: common::TestApp = common::spawn_app();
    let (_, token) = app.seed_user("Carol", None).await;

    for body in [
        json!({ "username": "no spaces allowed" }),
        json!({ "username": "ab" }),
        json!({ "name": "   " }),
        json!({ "bio": "x".repeat(501) }),
        json!({}),
    ] {
        let resp: Response = app.put("/api/profile").bearer_auth(&token).json(&body).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{body}");
    }
}

#[tokio::test]
async fn usernames_are_unique_regardless_of_case() {
    let app: common::TestApp = common::spawn_app();
    let (_, _) = app.seed_user("Alice", Some("alice")).await;
    let (_, token) = app.seed_user("Impostor", None).await;

    let resp: Response = app
        .put("/api/profile")
        .bearer_auth(&token)
        .json(&json!({ "username": "ALICE" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn malformed_bodies_get_an_error_kind() {
    let app: common::TestApp = common::spawn_app();
    let (_, token) = app.seed_user("Typo Tess", None).await;

    let resp: Response = app
        .put("/api/profile")
        .bearer_auth(&token)
        .header("content-type", "application/json")
        .body("{\"bio\": ")
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let json: Value = common::json_body(resp).await;
    assert_eq!(json["status"], "BAD_REQUEST");
    assert_eq!(json["data"]["error"], "bad_request");
    assert!(!json["messages"].as_array().unwrap().is_empty());
}
