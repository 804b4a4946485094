use std::sync::Arc;

use axum::{
    extract::{MatchedPath, Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::{AuthError, Identity, TokenValidator};
use crate::utils::api_error::ApiError;

/// Authentication scheme expected in the Authorization header
pub const BEARER_SCHEME: &str = "Bearer";

/// Interceptor for the protected group: validates the bearer token and
/// attaches the Identity, or short-circuits with 401.
pub async fn jwt_auth(
    State(validator): State<Arc<dyn TokenValidator>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let route: String = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p: &MatchedPath| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    // 1. Extract the bearer token
    let token: String = extract_bearer(request.headers())
        .inspect_err(|e| tracing::debug!("Rejected {}: {}", route, e))?
        .to_string();

    // 2. Validate it
    let identity: Identity = validator
        .validate(&token)
        .await
        .inspect_err(|e| tracing::debug!("Rejected {}: {}", route, e))?;

    tracing::debug!("User {} authenticated for {}", identity.user_id, route);

    // 3. Store in request extensions for the handler
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value: &str = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingToken)?;

    let (scheme, token) = value.trim().split_once(' ').ok_or(AuthError::MissingToken)?;
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        return Err(AuthError::MissingToken);
    }

    let token: &str = token.trim();
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }

    Ok(token)
}
