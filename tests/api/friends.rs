//! tests/api/friends.rs
//! Friend requests, acceptance and user search.

#[path = "../common/mod.rs"]
mod common;

use reqwest::{Response, StatusCode};
use serde_json::{json, Value};

#[tokio::test]
async fn add_friend_by_username_is_forwarded_to_the_handler() {
    let app: common::TestApp = common::spawn_app();
    let (alice, _) = app.seed_user("Alice", Some("alice")).await;
    let (_, bob_token) = app.seed_user("Bob", Some("bob")).await;

    let resp: Response = app
        .post("/api/friends/username")
        .bearer_auth(&bob_token)
        .json(&json!({ "username": "alice" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let json: Value = common::json_body(resp).await;
    assert_eq!(json["data"]["status"], "pending");
    assert_eq!(json["data"]["friend"]["id"], alice.id.to_string());
}

#[tokio::test]
async fn reverse_request_accepts_the_friendship() {
    let app: common::TestApp = common::spawn_app();
    let (alice, alice_token) = app.seed_user("Alice", Some("alice")).await;
    let (bob, bob_token) = app.seed_user("Bob", Some("bob")).await;

    // Bob asks, Alice sees the request
    let sent: Response = app
        .post("/api/friends")
        .bearer_auth(&bob_token)
        .json(&json!({ "friend_id": alice.id }))
        .send()
        .await
        .unwrap();
    assert_eq!(sent.status(), StatusCode::CREATED);

    let requests: Value = common::json_body(
        app.get("/api/friends/requests").bearer_auth(&alice_token).send().await.unwrap(),
    )
    .await;
    assert_eq!(requests["data"]["count"], 1);
    assert_eq!(requests["data"]["requests"][0]["from"]["id"], bob.id.to_string());

    // Alice adding Bob accepts instead of duplicating
    let accepted: Response = app
        .post("/api/friends")
        .bearer_auth(&alice_token)
        .json(&json!({ "friend_id": bob.id }))
        .send()
        .await
        .unwrap();
    assert_eq!(accepted.status(), StatusCode::OK);
    assert_eq!(common::json_body(accepted).await["data"]["status"], "accepted");

    for token in [&alice_token, &bob_token] {
        let friends: Value = common::json_body(
            app.get("/api/friends").bearer_auth(token).send().await.unwrap(),
        )
        .await;
        assert_eq!(friends["data"]["count"], 1);
    }

    let again: Response = app
        .post("/api/friends")
        .bearer_auth(&bob_token)
        .json(&json!({ "friend_id": alice.id }))
        .send()
        .await
        .unwrap();
    assert_eq!(again.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn invalid_friend_requests() {
    let app: common::TestApp = common::spawn_app();
    let (me, token) = app.seed_user("Solo", Some("solo")).await;
    let (other, _) = app.seed_user("Other", Some("other")).await;

    let to_self: Response = app
        .post("/api/friends")
        .bearer_auth(&token)
        .json(&json!({ "friend_id": me.id }))
        .send()
        .await
        .unwrap();
    assert_eq!(to_self.status(), StatusCode::BAD_REQUEST);

    let unknown: Response = app
        .post("/api/friends/username")
        .bearer_auth(&token)
        .json(&json!({ "username": "nobody_here" }))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

    let first: Response = app
        .post("/api/friends")
        .bearer_auth(&token)
        .json(&json!({ "friend_id": other.id }))
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let duplicate: Response = app
        .post("/api/friends")
        .bearer_auth(&token)
        .json(&json!({ "friend_id": other.id }))
        .send()
        .await
        .unwrap();
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn search_excludes_the_caller() {
    let app: common::TestApp = common::spawn_app();
    let (_, token) = app.seed_user("Maria Searcher", Some("maria_s")).await;
    app.seed_user("Mario Rossi", Some("mario")).await;
    app.seed_user("Zed", Some("zed")).await;

    let resp: Response = app.get("/api/users/search?q=mari").bearer_auth(&token).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json: Value = common::json_body(resp).await;
    assert_eq!(json["data"]["count"], 1);
    assert_eq!(json["data"]["users"][0]["username"], "mario");

    let short: Response = app.get("/api/users/search?q=m").bearer_auth(&token).send().await.unwrap();
    assert_eq!(short.status(), StatusCode::BAD_REQUEST);
}
