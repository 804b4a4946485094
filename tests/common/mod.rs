//! tests/common/mod.rs
//! A shared test helper to spawn the app on an ephemeral port, backed by
//! the in-memory repository and a scripted OAuth provider.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{Router, serve};
use juno_backend::auth::{AuthError, OAuthProvider};
use juno_backend::config::{environment::EnvironmentVariables, state::AppState};
use juno_backend::core::server::create_app;
use juno_backend::database::{MemoryRepository, Repository};
use juno_backend::models::{NewOAuthUser, ProfileUpdate, User};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tokio::net::TcpListener as TokioTcpListener;

/// Authorization code the stub provider accepts
pub const GOOD_CODE: &str = "good-code";
/// Authorization code that makes the provider hang past the server timeout
pub const SLOW_CODE: &str = "slow-code";
/// Authorization code that makes the provider fail internally
pub const BROKEN_CODE: &str = "broken-code";

pub const TEST_ORIGIN: &str = "http://localhost:5173";

/// Scripted stand-in for Google
pub struct StubOAuth;

#[async_trait]
impl OAuthProvider for StubOAuth {
    fn authorize_url(&self, state: &str) -> Result<String, AuthError> {
        Ok(format!("https://accounts.example.test/o/oauth2/auth?state={state}"))
    }

    async fn exchange_code(&self, code: &str) -> Result<NewOAuthUser, AuthError> {
        match code {
            GOOD_CODE => Ok(NewOAuthUser {
                google_id: "google-oauth-user".into(),
                email: "oauth.user@example.com".into(),
                name: "OAuth User".into(),
                avatar_url: None,
            }),
            SLOW_CODE => {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Err(AuthError::Provider("too slow".into()))
            }
            BROKEN_CODE => Err(AuthError::Internal(anyhow::anyhow!("provider exploded"))),
            _ => Err(AuthError::Provider("authorization code was rejected".into())),
        }
    }
}

pub struct TestApp {
    pub base_url: String,
    pub client: Client,
    pub state: AppState,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path))
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path))
    }

    pub fn put(&self, path: &str) -> RequestBuilder {
        self.client.put(self.url(path))
    }

    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.client.delete(self.url(path))
    }

    /// Creates a user directly in the repository and mints a token for them
    pub async fn seed_user(&self, name: &str, username: Option<&str>) -> (User, String) {
        let slug: String = name.to_lowercase().replace(' ', ".");
        let mut user: User = self
            .state
            .repository
            .upsert_oauth_user(NewOAuthUser {
                google_id: format!("google-{slug}"),
                email: format!("{slug}@example.com"),
                name: name.to_string(),
                avatar_url: None,
            })
            .await
            .expect("Failed to seed user");

        if let Some(username) = username {
            let update: ProfileUpdate = ProfileUpdate {
                username: Some(username.to_string()),
                ..ProfileUpdate::default()
            };
            user = self
                .state
                .repository
                .update_profile(user.id, update)
                .await
                .expect("Failed to set username");
        }

        let token: String = self.state.tokens.issue(&user).expect("Failed to issue token").token;
        (user, token)
    }
}

/// Parses a response body as the standard JSON envelope
pub async fn json_body(resp: reqwest::Response) -> Value {
    let body: String = resp.text().await.expect("Failed to read body");
    serde_json::from_str(&body).unwrap_or_else(|_| panic!("Body is not JSON: {body}"))
}

/// Spawns the app on a random unused port.
pub fn spawn_app() -> TestApp {
    spawn_app_with(&[])
}

/// Same as `spawn_app`, with extra environment variables on top of the test defaults
pub fn spawn_app_with(overrides: &[(&str, &str)]) -> TestApp {
    let mut vars: HashMap<String, String> = HashMap::from([
        ("ENVIRONMENT".to_string(), "test".to_string()),
        ("STORAGE_BACKEND".to_string(), "memory".to_string()),
        ("JWT_SECRET".to_string(), "integration-test-secret".to_string()),
    ]);
    for (key, value) in overrides {
        vars.insert(key.to_string(), value.to_string());
    }

    let env: EnvironmentVariables = EnvironmentVariables::from_map(&vars).expect("Invalid test env");
    let repository: Arc<dyn Repository> = Arc::new(MemoryRepository::new());
    let state: AppState = AppState::new(Arc::new(env), repository, Arc::new(StubOAuth));

    // * Build the application exactly as main() does.
    let app: Router = create_app(state.clone()).expect("Failed to build app");

    // * Bind an ephemeral port using std::net::TcpListener.
    let std_listener: std::net::TcpListener = std::net::TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind random port");
    std_listener.set_nonblocking(true).unwrap();

    // * Convert std::net::TcpListener to tokio::net::TcpListener.
    let tokio_listener: TokioTcpListener = TokioTcpListener::from_std(std_listener)
        .expect("Failed to convert to tokio listener");

    let addr: std::net::SocketAddr = tokio_listener.local_addr().unwrap();

    // * Spawn the server in a background task.
    tokio::spawn(async move {
        serve(tokio_listener, app)
            .await
            .expect("Server failed");
    });

    // * Redirects are asserted on, never followed.
    let client: Client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("Failed to build client");

    TestApp {
        base_url: format!("http://{}", addr),
        client,
        state,
    }
}
