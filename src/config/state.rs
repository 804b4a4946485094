// Application state shared by every handler

use std::sync::Arc;
use chrono::Duration;
use tracing::warn;

use crate::auth::{JwtService, OAuthProvider, OAuthStateStore, TokenValidator};
use crate::config::environment::{EnvironmentVariables, DEFAULT_JWT_TTL_HOURS};
use crate::database::Repository;

/// Collaborators built once at startup and injected into the router.
/// Cloning is cheap: every field is reference counted.
#[derive(Clone)]
pub struct AppState {
    pub environment: Arc<EnvironmentVariables>,
    pub repository: Arc<dyn Repository>,
    pub tokens: Arc<JwtService>,
    pub oauth: Arc<dyn OAuthProvider>,
    pub oauth_states: Arc<OAuthStateStore>,
}

impl AppState {
    /// Wires the collaborators; the JWT service is derived from the environment
    pub fn new(
        environment: Arc<EnvironmentVariables>,
        repository: Arc<dyn Repository>,
        oauth: Arc<dyn OAuthProvider>,
    ) -> Self {
        let tokens: JwtService = JwtService::new(&environment.jwt_secret, token_ttl(&environment));

        Self {
            environment,
            repository,
            tokens: Arc::new(tokens),
            oauth,
            oauth_states: Arc::new(OAuthStateStore::default()),
        }
    }

    /// Validator consulted by the JWT interceptor
    pub fn token_validator(&self) -> Arc<dyn TokenValidator> {
        self.tokens.clone()
    }

    /// Gracefully shutdown storage connections
    pub async fn shutdown(&self) {
        self.repository.shutdown().await;
    }
}

// * `from_map` range-checks the TTL; hand-built configs fall back to the default
fn token_ttl(environment: &EnvironmentVariables) -> Duration {
    Duration::try_hours(environment.jwt_ttl_hours)
        .filter(|ttl: &Duration| *ttl > Duration::zero())
        .unwrap_or_else(|| {
            warn!("Unusable JWT TTL of {} hours, using {}", environment.jwt_ttl_hours, DEFAULT_JWT_TTL_HOURS);
            Duration::hours(DEFAULT_JWT_TTL_HOURS)
        })
}
