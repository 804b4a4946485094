// Start of file: /src/models/mod.rs

/*
    * Domain records shared by handlers and repositories.
*/

pub mod friend;
pub mod ride;
pub mod user;

pub use friend::{FriendRequest, FriendStatus, Friendship};
pub use ride::{NearbyRide, NewRide, Ride, RideStatus};
pub use user::{NewOAuthUser, ProfileUpdate, User, UserSummary};

// End of file: /src/models/mod.rs
