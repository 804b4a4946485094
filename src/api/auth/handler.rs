use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::auth::{AuthError, Identity, IssuedToken, TokenValidator};
use crate::config::state::AppState;
use crate::models::{NewOAuthUser, User};
use crate::utils::api_error::{ApiError, ApiResult};
use crate::utils::response_handler::HandlerResponse;

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

// =============================================================================
// HANDLERS
// =============================================================================

/// Starts the Google OAuth flow by redirecting to the consent screen
#[instrument(name = "google_login", skip(state))]
pub async fn google_login(State(state): State<AppState>) -> ApiResult<Response> {
    let csrf_state: String = state.oauth_states.issue();
    let url: String = state.oauth.authorize_url(&csrf_state)?;

    Ok(Redirect::temporary(&url).into_response())
}

/// Completes the OAuth flow: exchanges the code, upserts the user and
/// hands out a session token
#[instrument(name = "google_callback", skip(state, params))]
pub async fn google_callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> ApiResult<Response> {
    if let Some(error) = params.error {
        warn!("Google returned an error: {}", error);
        return Err(ApiError::Unauthorized(format!("Google login failed: {error}")));
    }

    // 1. Verify the CSRF state we minted in google_login
    let csrf_ok: bool = params
        .state
        .as_deref()
        .is_some_and(|s: &str| state.oauth_states.consume(s));
    if !csrf_ok {
        return Err(AuthError::InvalidState.into());
    }

    // 2. Exchange the code with the provider
    let code: String = params
        .code
        .filter(|c: &String| !c.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing authorization code".to_string()))?;
    let profile: NewOAuthUser = state.oauth.exchange_code(&code).await?;

    // 3. Create or refresh the local user
    let user: User = state.repository.upsert_oauth_user(profile).await?;
    let issued: IssuedToken = state.tokens.issue(&user)?;

    info!("User {} logged in via Google", user.id);

    // 4. Hand the token to the frontend, or return it directly
    if let Some(frontend) = state.environment.frontend_url.as_deref() {
        let target: String = format!("{frontend}/auth/callback?token={}", issued.token);
        return Ok(Redirect::to(&target).into_response());
    }

    Ok(HandlerResponse::new(StatusCode::OK)
        .data(json!({
            "token": issued.token,
            "token_type": "Bearer",
            "expires_at": issued.expires_at,
            "user": user,
        }))
        .message("Login successful")
        .into_response())
}

/// Returns the profile behind the presented token
#[instrument(name = "current_user", skip(state, identity), fields(user_id = %identity.user_id))]
pub async fn current_user(State(state): State<AppState>, identity: Identity) -> ApiResult {
    let user: User = state
        .repository
        .get_user(identity.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(HandlerResponse::new(StatusCode::OK).data(json!(user)))
}

/// Revokes the presented token
#[instrument(name = "logout", skip(state, identity), fields(user_id = %identity.user_id))]
pub async fn logout(State(state): State<AppState>, identity: Identity) -> ApiResult {
    state.tokens.revoke(&identity).await;
    info!("User {} logged out", identity.user_id);

    Ok(HandlerResponse::new(StatusCode::OK).message("Logged out successfully"))
}
