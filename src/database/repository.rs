// =============================================================================
// REPOSITORY - Persistence contract for users, friendships and rides
// =============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    FriendRequest, Friendship, NewOAuthUser, NewRide, ProfileUpdate, Ride, RideStatus, User,
    UserSummary,
};

#[derive(Error, Debug)]
pub enum RepositoryError {
    /// The named record does not exist
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The write would break a uniqueness or capacity rule
    #[error("{0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Storage used by the domain handlers.
/// Implementations must apply each write atomically.
#[async_trait]
pub trait Repository: Send + Sync + 'static {
    // -------------------------------------------------------------------------
    // Users
    // -------------------------------------------------------------------------

    /// Creates the user on first login, refreshes email/name/avatar afterwards
    async fn upsert_oauth_user(&self, user: NewOAuthUser) -> RepositoryResult<User>;

    async fn get_user(&self, id: Uuid) -> RepositoryResult<Option<User>>;

    /// Case-insensitive lookup
    async fn find_user_by_username(&self, username: &str) -> RepositoryResult<Option<User>>;

    /// Conflict if the username belongs to someone else
    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> RepositoryResult<User>;

    /// Substring match on username or name, excluding `exclude`
    async fn search_users(
        &self,
        query: &str,
        exclude: Uuid,
        limit: usize,
    ) -> RepositoryResult<Vec<UserSummary>>;

    // -------------------------------------------------------------------------
    // Friendships
    // -------------------------------------------------------------------------

    /// The friendship between two users in either direction
    async fn friendship_between(&self, a: Uuid, b: Uuid) -> RepositoryResult<Option<Friendship>>;

    /// Conflict if any friendship already links the pair
    async fn create_friend_request(&self, from: Uuid, to: Uuid) -> RepositoryResult<Friendship>;

    /// Accepts the pending request sent by `requester` to `addressee`
    async fn accept_friend_request(
        &self,
        requester: Uuid,
        addressee: Uuid,
    ) -> RepositoryResult<Friendship>;

    async fn list_friends(&self, user_id: Uuid) -> RepositoryResult<Vec<UserSummary>>;

    /// Pending requests addressed to `user_id`, newest first
    async fn list_friend_requests(&self, user_id: Uuid) -> RepositoryResult<Vec<FriendRequest>>;

    // -------------------------------------------------------------------------
    // Rides
    // -------------------------------------------------------------------------

    async fn create_ride(&self, driver_id: Uuid, ride: NewRide) -> RepositoryResult<Ride>;

    async fn get_ride(&self, id: Uuid) -> RepositoryResult<Option<Ride>>;

    /// Rides driven or joined by `user_id`, by departure time
    async fn list_rides_for_user(&self, user_id: Uuid) -> RepositoryResult<Vec<Ride>>;

    /// Active rides departing after `after`
    async fn list_active_rides(&self, after: DateTime<Utc>) -> RepositoryResult<Vec<Ride>>;

    /// Conflict when the ride is full or the user already joined
    async fn add_participant(&self, ride_id: Uuid, user_id: Uuid) -> RepositoryResult<Ride>;

    /// Conflict when the user is not a participant
    async fn remove_participant(&self, ride_id: Uuid, user_id: Uuid) -> RepositoryResult<Ride>;

    async fn set_ride_status(&self, ride_id: Uuid, status: RideStatus) -> RepositoryResult<Ride>;

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    async fn shutdown(&self) {}
}
