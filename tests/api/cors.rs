//! tests/api/cors.rs
//! Every response carries the CORS headers, including errors and preflights.

#[path = "../common/mod.rs"]
mod common;

use reqwest::{Response, StatusCode};

fn header<'a>(resp: &'a Response, name: &str) -> Option<&'a str> {
    resp.headers().get(name).and_then(|v| v.to_str().ok())
}

fn assert_cors(resp: &Response) {
    assert_eq!(header(resp, "access-control-allow-origin"), Some(common::TEST_ORIGIN));
    assert_eq!(header(resp, "access-control-allow-credentials"), Some("true"));
}

#[tokio::test]
async fn success_responses_carry_cors_headers() {
    let app: common::TestApp = common::spawn_app();

    let resp: Response = app
        .get("/health")
        .header("origin", common::TEST_ORIGIN)
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(resp.status(), StatusCode::OK);
    assert_cors(&resp);

    let exposed: String = header(&resp, "access-control-expose-headers")
        .unwrap_or_default()
        .to_lowercase();
    assert!(exposed.contains("authorization"));
    assert!(exposed.contains("location"));
}

#[tokio::test]
async fn error_responses_carry_cors_headers() {
    let app: common::TestApp = common::spawn_app();

    let unauthorized: Response = app
        .get("/api/rides")
        .header("origin", common::TEST_ORIGIN)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(unauthorized.status(), StatusCode::UNAUTHORIZED);
    assert_cors(&unauthorized);

    let not_found: Response = app
        .get("/nowhere")
        .header("origin", common::TEST_ORIGIN)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
    assert_cors(&not_found);
}

#[tokio::test]
async fn preflight_is_answered_for_protected_routes() {
    let app: common::TestApp = common::spawn_app();

    let resp: Response = app
        .client
        .request(reqwest::Method::OPTIONS, app.url("/api/rides"))
        .header("origin", common::TEST_ORIGIN)
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "authorization,content-type")
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(resp.status(), StatusCode::OK);
    assert_cors(&resp);

    let methods: &str = header(&resp, "access-control-allow-methods").unwrap_or_default();
    for method in ["GET", "POST", "PUT", "DELETE", "OPTIONS"] {
        assert!(methods.contains(method), "{method} missing from {methods}");
    }

    let headers: String = header(&resp, "access-control-allow-headers")
        .unwrap_or_default()
        .to_lowercase();
    assert!(headers.contains("authorization"));
    assert!(headers.contains("content-type"));
}

#[tokio::test]
async fn configured_origins_are_enforced() {
    let app: common::TestApp = common::spawn_app_with(&[("CORS_ALLOWED_ORIGINS", "https://app.juno.test")]);

    let allowed: Response = app
        .get("/health")
        .header("origin", "https://app.juno.test")
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(header(&allowed, "access-control-allow-origin"), Some("https://app.juno.test"));

    let foreign: Response = app
        .get("/health")
        .header("origin", "https://evil.example")
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(header(&foreign, "access-control-allow-origin"), None);
}
