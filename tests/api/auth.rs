//! tests/api/auth.rs
//! Google login flow, the JWT interceptor and logout.

#[path = "../common/mod.rs"]
mod common;

use juno_backend::core::router::{Access, Dispatcher, RouteEntry};
use juno_backend::core::server::build_dispatcher;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app: common::TestApp = common::spawn_app();
    let dispatcher: Dispatcher = build_dispatcher().expect("Route table should build");

    let protected: Vec<&RouteEntry> = dispatcher
        .entries()
        .iter()
        .filter(|entry: &&RouteEntry| entry.access == Access::Protected)
        .collect();
    assert_eq!(protected.len(), 16);

    let ride_id: String = uuid::Uuid::new_v4().to_string();
    for entry in protected {
        let path: String = entry.pattern.replace(":id", &ride_id);
        let method: Method = Method::from_bytes(entry.method.as_str().as_bytes()).unwrap();

        for token in [None, Some("not-a-jwt")] {
            let mut request: RequestBuilder = app
                .client
                .request(method.clone(), app.url(&path))
                .header("origin", common::TEST_ORIGIN);
            if let Some(token) = token {
                request = request.bearer_auth(token);
            }

            let resp: Response = request.send().await.expect("Failed to execute request.");
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{method} {path}");
            assert_eq!(
                resp.headers()
                    .get("access-control-allow-origin")
                    .and_then(|v| v.to_str().ok()),
                Some(common::TEST_ORIGIN),
                "{method} {path}"
            );
            assert_eq!(
                resp.headers()
                    .get("access-control-allow-credentials")
                    .and_then(|v| v.to_str().ok()),
                Some("true"),
                "{method} {path}"
            );

            let json: Value = common::json_body(resp).await;
            assert_eq!(json["status"], "UNAUTHORIZED");
            assert_eq!(json["data"]["error"], "unauthorized");
        }
    }
}

#[tokio::test]
async fn rejected_requests_never_reach_the_handler() {
    let app: common::TestApp = common::spawn_app();
    let (_, token) = app.seed_user("Driver Dana", None).await;

    let body: Value = json!({
        "origin": "Campus",
        "destination": "Airport",
        "origin_lat": 40.0,
        "origin_lng": -3.0,
        "destination_lat": 40.4,
        "destination_lng": -3.6,
        "departure_time": (chrono::Utc::now() + chrono::Duration::hours(2)).to_rfc3339(),
        "total_seats": 3
    });

    let resp: Response = app
        .post("/api/rides")
        .bearer_auth("not-a-jwt")
        .json(&body)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let listed: Value = common::json_body(
        app.get("/api/rides").bearer_auth(&token).send().await.unwrap(),
    )
    .await;
    assert_eq!(listed["data"]["count"], 0);
}

#[tokio::test]
async fn tokens_signed_with_another_secret_are_rejected() {
    let app: common::TestApp = common::spawn_app();
    let other: common::TestApp = common::spawn_app_with(&[("JWT_SECRET", "some-other-secret")]);
    let (_, foreign_token) = other.seed_user("Mallory", None).await;

    let resp: Response = app
        .get("/auth/me")
        .bearer_auth(&foreign_token)
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_returns_the_token_owner() {
    let app: common::TestApp = common::spawn_app();
    let (user, token) = app.seed_user("Alice Liddell", Some("alice")).await;

    let resp: Response = app.get("/auth/me").bearer_auth(&token).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json: Value = common::json_body(resp).await;
    assert_eq!(json["data"]["id"], user.id.to_string());
    assert_eq!(json["data"]["username"], "alice");
    assert!(json["data"].get("google_id").is_none());
}

#[tokio::test]
async fn logout_revokes_the_token() {
    let app: common::TestApp = common::spawn_app();
    let (_, token) = app.seed_user("Leaving Lee", None).await;

    let resp: Response = app.post("/auth/logout").bearer_auth(&token).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let again: Response = app.get("/auth/me").bearer_auth(&token).send().await.unwrap();
    assert_eq!(again.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn google_login_redirects_with_state() {
    let app: common::TestApp = common::spawn_app();

    let resp: Response = app.get("/auth/google").send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);

    let location: &str = resp
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(location.starts_with("https://accounts.example.test/"));

    let state: &str = location.split("state=").nth(1).unwrap();
    assert!(app.state.oauth_states.consume(state));
}

#[tokio::test]
async fn callback_issues_a_usable_token() {
    let app: common::TestApp = common::spawn_app();
    let csrf_state: String = app.state.oauth_states.issue();

    let path: String = format!("/auth/google/callback?code={}&state={}", common::GOOD_CODE, csrf_state);
    let resp: Response = app.get(&path).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json: Value = common::json_body(resp).await;
    assert_eq!(json["data"]["token_type"], "Bearer");
    assert_eq!(json["data"]["user"]["email"], "oauth.user@example.com");

    let token: &str = json["data"]["token"].as_str().unwrap();
    let me: Response = app.get("/auth/me").bearer_auth(token).send().await.unwrap();
    assert_eq!(me.status(), StatusCode::OK);
}

#[tokio::test]
async fn callback_redirects_to_the_frontend_when_configured() {
    let app: common::TestApp = common::spawn_app_with(&[("FRONTEND_URL", "http://localhost:5173/")]);
    let csrf_state: String = app.state.oauth_states.issue();

    let path: String = format!("/auth/google/callback?code={}&state={}", common::GOOD_CODE, csrf_state);
    let resp: Response = app.get(&path).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let location: &str = resp
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(location.starts_with("http://localhost:5173/auth/callback?token="));
}

#[tokio::test]
async fn callback_rejects_unknown_or_reused_state() {
    let app: common::TestApp = common::spawn_app();

    let forged: Response = app
        .get(&format!("/auth/google/callback?code={}&state=forged", common::GOOD_CODE))
        .send()
        .await
        .unwrap();
    assert_eq!(forged.status(), StatusCode::BAD_REQUEST);

    let csrf_state: String = app.state.oauth_states.issue();
    let path: String = format!("/auth/google/callback?code={}&state={}", common::GOOD_CODE, csrf_state);
    assert_eq!(app.get(&path).send().await.unwrap().status(), StatusCode::OK);
    assert_eq!(app.get(&path).send().await.unwrap().status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn callback_surfaces_provider_failures() {
    let app: common::TestApp = common::spawn_app();

    let denied: Response = app
        .get("/auth/google/callback?error=access_denied")
        .send()
        .await
        .unwrap();
    assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

    let csrf_state: String = app.state.oauth_states.issue();
    let rejected: Response = app
        .get(&format!("/auth/google/callback?code=bad-code&state={csrf_state}"))
        .send()
        .await
        .unwrap();
    assert_eq!(rejected.status(), StatusCode::UNAUTHORIZED);
}
