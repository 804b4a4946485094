// Profile handlers for the authenticated user

use axum::{extract::State, http::StatusCode, Json};
use serde_json::json;
use tracing::{info, instrument};

use crate::auth::Identity;
use crate::config::state::AppState;
use crate::models::{ProfileUpdate, User};
use crate::utils::api_error::{ApiError, ApiResult};
use crate::utils::response_handler::HandlerResponse;

/// Returns the caller's full profile
#[instrument(name = "get_profile", skip(state, identity), fields(user_id = %identity.user_id))]
pub async fn get_profile(State(state): State<AppState>, identity: Identity) -> ApiResult {
    let user: User = state
        .repository
        .get_user(identity.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    Ok(HandlerResponse::new(StatusCode::OK).data(json!(user)))
}

/// Applies a partial update; absent fields keep their value
#[instrument(name = "update_profile", skip(state, identity, update), fields(user_id = %identity.user_id))]
pub async fn update_profile(
    State(state): State<AppState>,
    identity: Identity,
    Json(update): Json<ProfileUpdate>,
) -> ApiResult {
    let update: ProfileUpdate = update.validated().map_err(ApiError::BadRequest)?;
    if update.is_empty() {
        return Err(ApiError::BadRequest("No profile fields to update".to_string()));
    }

    let user: User = state.repository.update_profile(identity.user_id, update).await?;
    info!("Profile updated for user {}", user.id);

    Ok(HandlerResponse::new(StatusCode::OK)
        .data(json!(user))
        .message("Profile updated successfully"))
}
