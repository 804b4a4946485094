// Authenticated principal attached to protected requests

use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::utils::api_error::ApiError;

/// Principal extracted from a validated bearer token.
/// Only the JWT interceptor inserts it into request extensions.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    /// `jti` of the presented token, used for revocation
    pub token_id: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,

    #[error("invalid token")]
    InvalidToken,

    #[error("token has expired")]
    Expired,

    #[error("token has been revoked")]
    Revoked,

    #[error("invalid or expired OAuth state")]
    InvalidState,

    #[error("OAuth provider error: {0}")]
    Provider(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidState => ApiError::BadRequest(err.to_string()),
            AuthError::Internal(e) => ApiError::Internal(e),
            other => ApiError::Unauthorized(other.to_string()),
        }
    }
}

// * Handlers that take an Identity cannot run without one, even if a
// * route were registered outside the protected group by mistake.
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))
    }
}
