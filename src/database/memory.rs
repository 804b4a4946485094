// =============================================================================
// MEMORY REPOSITORY - In-process storage for development and tests
// =============================================================================

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::repository::{Repository, RepositoryError, RepositoryResult};
use crate::models::{
    FriendRequest, FriendStatus, Friendship, NewOAuthUser, NewRide, ProfileUpdate, Ride,
    RideStatus, User, UserSummary,
};

#[derive(Debug, Default)]
struct MemoryData {
    users: HashMap<Uuid, User>,
    friendships: Vec<Friendship>,
    rides: HashMap<Uuid, Ride>,
}

/// Repository keeping everything behind one async RwLock
#[derive(Debug, Default)]
pub struct MemoryRepository {
    data: RwLock<MemoryData>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn upsert_oauth_user(&self, user: NewOAuthUser) -> RepositoryResult<User> {
        let mut data = self.data.write().await;
        let now: DateTime<Utc> = Utc::now();

        if let Some(existing) = data.users.values_mut().find(|u: &&mut User| u.google_id == user.google_id) {
            existing.email = user.email;
            existing.name = user.name;
            if user.avatar_url.is_some() {
                existing.avatar_url = user.avatar_url;
            }
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let created: User = User {
            id: Uuid::new_v4(),
            google_id: user.google_id,
            email: user.email,
            name: user.name,
            username: None,
            avatar_url: user.avatar_url,
            bio: None,
            phone: None,
            created_at: now,
            updated_at: now,
        };
        data.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_user(&self, id: Uuid) -> RepositoryResult<Option<User>> {
        Ok(self.data.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> RepositoryResult<Option<User>> {
        let needle: String = username.trim().to_lowercase();
        let data = self.data.read().await;

        Ok(data
            .users
            .values()
            .find(|u: &&User| u.username.as_deref() == Some(needle.as_str()))
            .cloned())
    }

    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> RepositoryResult<User> {
        let mut data = self.data.write().await;

        if let Some(username) = update.username.as_deref() {
            let taken: bool = data
                .users
                .values()
                .any(|u: &User| u.id != id && u.username.as_deref() == Some(username));
            if taken {
                return Err(RepositoryError::Conflict("username is already taken".into()));
            }
        }

        let user: &mut User = data.users.get_mut(&id).ok_or(RepositoryError::NotFound("user"))?;
        if let Some(name) = update.name {
            user.name = name;
        }
        if let Some(username) = update.username {
            user.username = Some(username);
        }
        if let Some(bio) = update.bio {
            user.bio = Some(bio);
        }
        if let Some(phone) = update.phone {
            user.phone = Some(phone);
        }
        if let Some(avatar_url) = update.avatar_url {
            user.avatar_url = Some(avatar_url);
        }
        user.updated_at = Utc::now();

        Ok(user.clone())
    }

    async fn search_users(
        &self,
        query: &str,
        exclude: Uuid,
        limit: usize,
    ) -> RepositoryResult<Vec<UserSummary>> {
        let needle: String = query.trim().to_lowercase();
        let data = self.data.read().await;

        let mut found: Vec<UserSummary> = data
            .users
            .values()
            .filter(|u: &&User| u.id != exclude)
            .filter(|u: &&User| {
                u.name.to_lowercase().contains(&needle)
                    || u.username.as_deref().is_some_and(|n: &str| n.contains(&needle))
            })
            .map(User::summary)
            .collect();

        found.sort_by(|a, b| a.name.cmp(&b.name));
        found.truncate(limit);
        Ok(found)
    }

    async fn friendship_between(&self, a: Uuid, b: Uuid) -> RepositoryResult<Option<Friendship>> {
        let data = self.data.read().await;
        Ok(data.friendships.iter().find(|f: &&Friendship| f.involves(a, b)).cloned())
    }

    async fn create_friend_request(&self, from: Uuid, to: Uuid) -> RepositoryResult<Friendship> {
        let mut data = self.data.write().await;

        if !data.users.contains_key(&to) {
            return Err(RepositoryError::NotFound("user"));
        }
        if data.friendships.iter().any(|f: &Friendship| f.involves(from, to)) {
            return Err(RepositoryError::Conflict("a friendship already exists".into()));
        }

        let friendship: Friendship = Friendship {
            requester_id: from,
            addressee_id: to,
            status: FriendStatus::Pending,
            created_at: Utc::now(),
        };
        data.friendships.push(friendship.clone());
        Ok(friendship)
    }

    async fn accept_friend_request(
        &self,
        requester: Uuid,
        addressee: Uuid,
    ) -> RepositoryResult<Friendship> {
        let mut data = self.data.write().await;

        let friendship: &mut Friendship = data
            .friendships
            .iter_mut()
            .find(|f: &&mut Friendship| {
                f.requester_id == requester
                    && f.addressee_id == addressee
                    && f.status == FriendStatus::Pending
            })
            .ok_or(RepositoryError::NotFound("friend request"))?;

        friendship.status = FriendStatus::Accepted;
        Ok(friendship.clone())
    }

    async fn list_friends(&self, user_id: Uuid) -> RepositoryResult<Vec<UserSummary>> {
        let data = self.data.read().await;

        let mut friends: Vec<UserSummary> = data
            .friendships
            .iter()
            .filter(|f: &&Friendship| f.status == FriendStatus::Accepted)
            .filter(|f: &&Friendship| f.requester_id == user_id || f.addressee_id == user_id)
            .filter_map(|f: &Friendship| data.users.get(&f.other(user_id)))
            .map(User::summary)
            .collect();

        friends.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(friends)
    }

    async fn list_friend_requests(&self, user_id: Uuid) -> RepositoryResult<Vec<FriendRequest>> {
        let data = self.data.read().await;

        let mut requests: Vec<FriendRequest> = data
            .friendships
            .iter()
            .filter(|f: &&Friendship| f.status == FriendStatus::Pending && f.addressee_id == user_id)
            .filter_map(|f: &Friendship| {
                data.users.get(&f.requester_id).map(|u: &User| FriendRequest {
                    from: u.summary(),
                    created_at: f.created_at,
                })
            })
            .collect();

        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    async fn create_ride(&self, driver_id: Uuid, ride: NewRide) -> RepositoryResult<Ride> {
        let mut data = self.data.write().await;

        let created: Ride = Ride {
            id: Uuid::new_v4(),
            driver_id,
            origin: ride.origin,
            destination: ride.destination,
            origin_lat: ride.origin_lat,
            origin_lng: ride.origin_lng,
            destination_lat: ride.destination_lat,
            destination_lng: ride.destination_lng,
            departure_time: ride.departure_time,
            total_seats: ride.total_seats,
            status: RideStatus::Active,
            participants: Vec::new(),
            created_at: Utc::now(),
        };
        data.rides.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_ride(&self, id: Uuid) -> RepositoryResult<Option<Ride>> {
        Ok(self.data.read().await.rides.get(&id).cloned())
    }

    async fn list_rides_for_user(&self, user_id: Uuid) -> RepositoryResult<Vec<Ride>> {
        let data = self.data.read().await;

        let mut rides: Vec<Ride> = data
            .rides
            .values()
            .filter(|r: &&Ride| r.involves(user_id))
            .cloned()
            .collect();

        rides.sort_by_key(|r: &Ride| r.departure_time);
        Ok(rides)
    }

    async fn list_active_rides(&self, after: DateTime<Utc>) -> RepositoryResult<Vec<Ride>> {
        let data = self.data.read().await;

        Ok(data
            .rides
            .values()
            .filter(|r: &&Ride| r.status == RideStatus::Active && r.departure_time > after)
            .cloned()
            .collect())
    }

    async fn add_participant(&self, ride_id: Uuid, user_id: Uuid) -> RepositoryResult<Ride> {
        let mut data = self.data.write().await;
        let ride: &mut Ride = data.rides.get_mut(&ride_id).ok_or(RepositoryError::NotFound("ride"))?;

        if ride.status != RideStatus::Active {
            return Err(RepositoryError::Conflict("Ride is not active".into()));
        }
        if ride.departure_time <= Utc::now() {
            return Err(RepositoryError::Conflict("Ride has already departed".into()));
        }
        if ride.is_participant(user_id) {
            return Err(RepositoryError::Conflict("already joined this ride".into()));
        }
        if ride.seats_available() == 0 {
            return Err(RepositoryError::Conflict("ride is full".into()));
        }

        ride.participants.push(user_id);
        Ok(ride.clone())
    }

    async fn remove_participant(&self, ride_id: Uuid, user_id: Uuid) -> RepositoryResult<Ride> {
        let mut data = self.data.write().await;
        let ride: &mut Ride = data.rides.get_mut(&ride_id).ok_or(RepositoryError::NotFound("ride"))?;

        if !ride.is_participant(user_id) {
            return Err(RepositoryError::Conflict("not a participant of this ride".into()));
        }

        ride.participants.retain(|p: &Uuid| *p != user_id);
        Ok(ride.clone())
    }

    async fn set_ride_status(&self, ride_id: Uuid, status: RideStatus) -> RepositoryResult<Ride> {
        let mut data = self.data.write().await;
        let ride: &mut Ride = data.rides.get_mut(&ride_id).ok_or(RepositoryError::NotFound("ride"))?;

        ride.status = status;
        Ok(ride.clone())
    }
}
