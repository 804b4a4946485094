// Friendship records

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::user::UserSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendStatus {
    Pending,
    Accepted,
}

impl FriendStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FriendStatus::Pending => "pending",
            FriendStatus::Accepted => "accepted",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(FriendStatus::Pending),
            "accepted" => Some(FriendStatus::Accepted),
            _ => None,
        }
    }
}

/// A directed request that becomes mutual once accepted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Friendship {
    pub requester_id: Uuid,
    pub addressee_id: Uuid,
    pub status: FriendStatus,
    pub created_at: DateTime<Utc>,
}

impl Friendship {
    pub fn involves(&self, a: Uuid, b: Uuid) -> bool {
        (self.requester_id == a && self.addressee_id == b)
            || (self.requester_id == b && self.addressee_id == a)
    }

    /// The other side of the friendship, seen from `user_id`
    pub fn other(&self, user_id: Uuid) -> Uuid {
        if self.requester_id == user_id {
            self.addressee_id
        } else {
            self.requester_id
        }
    }
}

/// Incoming pending request as shown to the addressee
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FriendRequest {
    pub from: UserSummary,
    pub created_at: DateTime<Utc>,
}
