// Google OAuth 2.0 login flow

use std::time::{Duration, Instant};

use anyhow::Context;
use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::Url;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::identity::AuthError;
use crate::config::environment::EnvironmentVariables;
use crate::models::NewOAuthUser;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";
const GOOGLE_SCOPES: &str = "openid email profile";
const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);
const STATE_TTL: Duration = Duration::from_secs(600);
const MAX_PENDING_STATES: usize = 10_000;

/// Third-party login used by `/auth/google` and its callback
#[async_trait]
pub trait OAuthProvider: Send + Sync + 'static {
    /// Consent-screen URL carrying the CSRF `state`
    fn authorize_url(&self, state: &str) -> Result<String, AuthError>;

    /// Trades an authorization code for the user's profile
    async fn exchange_code(&self, code: &str) -> Result<NewOAuthUser, AuthError>;
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct GoogleUserInfo {
    sub: String,
    email: String,
    name: Option<String>,
    picture: Option<String>,
    email_verified: Option<bool>,
}

/// OAuth client built once at startup and injected through AppState
pub struct GoogleOAuth {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_url: String,
}

impl GoogleOAuth {
    pub fn from_env(env: &EnvironmentVariables) -> anyhow::Result<Self> {
        Url::parse(&env.google_redirect_url)
            .with_context(|| format!("Invalid GOOGLE_REDIRECT_URL '{}'", env.google_redirect_url))?;

        if env.is_production() && (env.google_client_id.is_empty() || env.google_client_secret.is_empty()) {
            anyhow::bail!("GOOGLE_CLIENT_ID and GOOGLE_CLIENT_SECRET must be set in production");
        }

        let http: reqwest::Client = reqwest::Client::builder()
            .timeout(PROVIDER_TIMEOUT)
            .build()
            .context("Failed to build OAuth HTTP client")?;

        info!("Google OAuth configured with redirect {}", env.google_redirect_url);

        Ok(Self {
            http,
            client_id: env.google_client_id.to_string(),
            client_secret: env.google_client_secret.to_string(),
            redirect_url: env.google_redirect_url.to_string(),
        })
    }
}

#[async_trait]
impl OAuthProvider for GoogleOAuth {
    fn authorize_url(&self, state: &str) -> Result<String, AuthError> {
        let url: Url = Url::parse_with_params(
            GOOGLE_AUTH_URL,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_url.as_str()),
                ("response_type", "code"),
                ("scope", GOOGLE_SCOPES),
                ("state", state),
                ("access_type", "online"),
                ("prompt", "select_account"),
            ],
        )
        .context("Failed to build Google authorization URL")?;

        Ok(url.into())
    }

    async fn exchange_code(&self, code: &str) -> Result<NewOAuthUser, AuthError> {
        let token_response: reqwest::Response = self
            .http
            .post(GOOGLE_TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.redirect_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .context("Google token request failed")?;

        if !token_response.status().is_success() {
            let status: reqwest::StatusCode = token_response.status();
            let body: String = token_response.text().await.unwrap_or_default();
            warn!("Google token exchange rejected ({}): {}", status, body);
            return Err(AuthError::Provider("authorization code was rejected".into()));
        }

        let token: TokenResponse = token_response
            .json()
            .await
            .context("Malformed Google token response")?;

        let info: GoogleUserInfo = self
            .http
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .context("Google userinfo request failed")?
            .error_for_status()
            .map_err(|e| AuthError::Provider(format!("userinfo request failed: {e}")))?
            .json()
            .await
            .context("Malformed Google userinfo response")?;

        if info.email_verified == Some(false) {
            return Err(AuthError::Provider("Google account email is not verified".into()));
        }

        let name: String = info
            .name
            .filter(|n: &String| !n.trim().is_empty())
            .unwrap_or_else(|| info.email.split('@').next().unwrap_or_default().to_string());

        Ok(NewOAuthUser {
            google_id: info.sub,
            email: info.email,
            name,
            avatar_url: info.picture,
        })
    }
}

/// Short-lived CSRF states minted by `/auth/google`
#[derive(Debug)]
pub struct OAuthStateStore {
    states: DashMap<String, Instant>,
    ttl: Duration,
    capacity: usize,
}

impl Default for OAuthStateStore {
    fn default() -> Self {
        Self::new(STATE_TTL)
    }
}

impl OAuthStateStore {
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, MAX_PENDING_STATES)
    }

    /// Keeps at most `capacity` pending states; the oldest is evicted first
    pub fn with_capacity(ttl: Duration, capacity: usize) -> Self {
        Self {
            states: DashMap::new(),
            ttl,
            capacity: capacity.max(1),
        }
    }

    pub fn issue(&self) -> String {
        let now: Instant = Instant::now();
        self.states.retain(|_, issued: &mut Instant| now.duration_since(*issued) < self.ttl);

        while self.states.len() >= self.capacity {
            let oldest: Option<String> = self
                .states
                .iter()
                .min_by_key(|entry| *entry.value())
                .map(|entry| entry.key().clone());
            match oldest {
                Some(key) => {
                    tracing::warn!("OAuth state store full, evicting oldest pending login");
                    self.states.remove(&key);
                }
                None => break,
            }
        }

        let state: String = Uuid::new_v4().simple().to_string();
        self.states.insert(state.clone(), now);
        state
    }

    /// True once per issued, unexpired state
    pub fn consume(&self, state: &str) -> bool {
        match self.states.remove(state) {
            Some((_, issued)) => issued.elapsed() < self.ttl,
            None => false,
        }
    }

    /// Number of pending states
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
