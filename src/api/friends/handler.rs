// Friends and user search handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::Identity;
use crate::config::state::AppState;
use crate::models::{FriendRequest, FriendStatus, Friendship, User, UserSummary};
use crate::utils::api_error::{ApiError, ApiResult};
use crate::utils::response_handler::HandlerResponse;

const MIN_SEARCH_LEN: usize = 2;
const SEARCH_LIMIT: usize = 20;

#[derive(Debug, Deserialize)]
pub struct AddFriendRequest {
    pub friend_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct AddFriendByUsernameRequest {
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

/// Accepted friends of the caller
#[instrument(name = "list_friends", skip(state, identity), fields(user_id = %identity.user_id))]
pub async fn list_friends(State(state): State<AppState>, identity: Identity) -> ApiResult {
    let friends: Vec<UserSummary> = state.repository.list_friends(identity.user_id).await?;

    Ok(HandlerResponse::new(StatusCode::OK).data(json!({
        "friends": friends,
        "count": friends.len(),
    })))
}

/// Sends (or accepts) a friend request by user id
#[instrument(name = "add_friend", skip(state, identity), fields(user_id = %identity.user_id))]
pub async fn add_friend(
    State(state): State<AppState>,
    identity: Identity,
    Json(request): Json<AddFriendRequest>,
) -> ApiResult {
    let target: User = state
        .repository
        .get_user(request.friend_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    send_friend_request(&state, identity.user_id, target).await
}

/// Same as `add_friend`, looking the target up by username
#[instrument(name = "add_friend_by_username", skip(state, identity), fields(user_id = %identity.user_id))]
pub async fn add_friend_by_username(
    State(state): State<AppState>,
    identity: Identity,
    Json(request): Json<AddFriendByUsernameRequest>,
) -> ApiResult {
    let username: &str = request.username.trim();
    if username.is_empty() {
        return Err(ApiError::BadRequest("username is required".to_string()));
    }

    let target: User = state
        .repository
        .find_user_by_username(username)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No user with username '{username}'")))?;

    send_friend_request(&state, identity.user_id, target).await
}

/// Pending requests waiting on the caller
#[instrument(name = "friend_requests", skip(state, identity), fields(user_id = %identity.user_id))]
pub async fn friend_requests(State(state): State<AppState>, identity: Identity) -> ApiResult {
    let requests: Vec<FriendRequest> = state.repository.list_friend_requests(identity.user_id).await?;

    Ok(HandlerResponse::new(StatusCode::OK).data(json!({
        "requests": requests,
        "count": requests.len(),
    })))
}

/// Finds other users by name or username
#[instrument(name = "search_users", skip(state, identity), fields(user_id = %identity.user_id))]
pub async fn search_users(
    State(state): State<AppState>,
    identity: Identity,
    Query(params): Query<SearchParams>,
) -> ApiResult {
    let query: String = params.q.unwrap_or_default().trim().to_string();
    if query.chars().count() < MIN_SEARCH_LEN {
        return Err(ApiError::BadRequest(format!(
            "Search query must be at least {MIN_SEARCH_LEN} characters"
        )));
    }

    let users: Vec<UserSummary> = state
        .repository
        .search_users(&query, identity.user_id, SEARCH_LIMIT)
        .await?;

    Ok(HandlerResponse::new(StatusCode::OK).data(json!({
        "users": users,
        "count": users.len(),
    })))
}

// =============================================================================
// INTERNAL
// =============================================================================

/// A pending request from the target is accepted instead of duplicated
async fn send_friend_request(state: &AppState, from: Uuid, target: User) -> ApiResult {
    if target.id == from {
        return Err(ApiError::BadRequest("You cannot add yourself as a friend".to_string()));
    }

    let existing: Option<Friendship> = state.repository.friendship_between(from, target.id).await?;

    match existing {
        Some(f) if f.status == FriendStatus::Accepted => {
            Err(ApiError::Conflict("You are already friends".to_string()))
        }
        Some(f) if f.requester_id == from => {
            Err(ApiError::Conflict("Friend request already sent".to_string()))
        }
        Some(_) => {
            state.repository.accept_friend_request(target.id, from).await?;
            info!("User {} accepted friend request from {}", from, target.id);

            Ok(HandlerResponse::new(StatusCode::OK)
                .data(json!({ "status": FriendStatus::Accepted, "friend": target.summary() }))
                .message("Friend request accepted"))
        }
        None => {
            state.repository.create_friend_request(from, target.id).await?;
            info!("User {} sent a friend request to {}", from, target.id);

            Ok(HandlerResponse::new(StatusCode::CREATED)
                .data(json!({ "status": FriendStatus::Pending, "friend": target.summary() }))
                .message("Friend request sent"))
        }
    }
}
