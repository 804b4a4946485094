// Process-wide CORS policy, applied to every response

use std::time::Duration;

use anyhow::{Context, Result};
use axum::http::{header, HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};

use crate::config::environment::EnvironmentVariables;

const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(12 * 60 * 60);

/// Who may call the API from a browser and what they may see.
/// Credentials are allowed, so origins and request headers are mirrored
/// instead of answered with `*`.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    // * Empty means "mirror the request origin"
    pub allowed_origins: Vec<HeaderValue>,
    pub allowed_methods: Vec<Method>,
    pub exposed_headers: Vec<HeaderName>,
    pub allow_credentials: bool,
}

impl CorsPolicy {
    pub fn from_env(env: &EnvironmentVariables) -> Result<Self> {
        let allowed_origins: Vec<HeaderValue> = env
            .cors_allowed_origins
            .iter()
            .map(|origin: &String| {
                HeaderValue::from_str(origin)
                    .with_context(|| format!("Invalid origin '{origin}' in CORS_ALLOWED_ORIGINS"))
            })
            .collect::<Result<_>>()?;

        Ok(Self {
            allowed_origins,
            ..Self::default()
        })
    }

    pub fn mirrors_origin(&self) -> bool {
        self.allowed_origins.is_empty()
    }

    /// Builds the tower-http layer. It answers preflights itself and
    /// decorates every other response on the way out.
    pub fn layer(&self) -> CorsLayer {
        let origin: AllowOrigin = if self.mirrors_origin() {
            AllowOrigin::mirror_request()
        } else {
            AllowOrigin::list(self.allowed_origins.clone())
        };

        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(self.allowed_methods.clone())
            .allow_headers(AllowHeaders::mirror_request())
            .expose_headers(self.exposed_headers.clone())
            .allow_credentials(self.allow_credentials)
            .max_age(PREFLIGHT_MAX_AGE)
    }
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            allowed_methods: vec![
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ],
            exposed_headers: vec![header::CONTENT_TYPE, header::AUTHORIZATION, header::LOCATION],
            allow_credentials: true,
        }
    }
}
