// User records and profile validation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const MAX_NAME_LEN: usize = 100;
const MIN_USERNAME_LEN: usize = 3;
const MAX_USERNAME_LEN: usize = 30;
const MAX_BIO_LEN: usize = 500;
const MAX_PHONE_LEN: usize = 32;

/// Full profile of a registered user
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub google_id: String,
    pub email: String,
    pub name: String,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            name: self.name.clone(),
            username: self.username.clone(),
            avatar_url: self.avatar_url.clone(),
        }
    }
}

/// Public view of another user (friends lists, search results)
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
}

/// Identity reported by the OAuth provider after a successful login
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewOAuthUser {
    pub google_id: String,
    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
}

/// Partial profile update; `None` leaves the field untouched
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub username: Option<String>,
    pub bio: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
}

impl ProfileUpdate {
    /// Trims and checks every provided field, lowercasing the username
    pub fn validated(self) -> Result<Self, String> {
        let name: Option<String> = match self.name {
            Some(name) => {
                let name: String = name.trim().to_string();
                if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
                    return Err(format!("name must be between 1 and {MAX_NAME_LEN} characters"));
                }
                Some(name)
            }
            None => None,
        };

        let username: Option<String> = match self.username {
            Some(username) => Some(normalize_username(&username)?),
            None => None,
        };

        let bio: Option<String> = self.bio.map(|b: String| b.trim().to_string());
        if bio.as_deref().is_some_and(|b: &str| b.chars().count() > MAX_BIO_LEN) {
            return Err(format!("bio cannot exceed {MAX_BIO_LEN} characters"));
        }

        let phone: Option<String> = self.phone.map(|p: String| p.trim().to_string());
        if phone.as_deref().is_some_and(|p: &str| p.chars().count() > MAX_PHONE_LEN) {
            return Err(format!("phone cannot exceed {MAX_PHONE_LEN} characters"));
        }

        Ok(Self {
            name,
            username,
            bio,
            phone,
            avatar_url: self.avatar_url.map(|a: String| a.trim().to_string()),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.username.is_none()
            && self.bio.is_none()
            && self.phone.is_none()
            && self.avatar_url.is_none()
    }
}

/// Usernames are 3-30 chars of [A-Za-z0-9_], stored lowercase
pub fn normalize_username(raw: &str) -> Result<String, String> {
    let username: String = raw.trim().to_lowercase();
    let len: usize = username.chars().count();

    if !(MIN_USERNAME_LEN..=MAX_USERNAME_LEN).contains(&len) {
        return Err(format!(
            "username must be between {MIN_USERNAME_LEN} and {MAX_USERNAME_LEN} characters"
        ));
    }
    if !username.chars().all(|c: char| c.is_ascii_alphanumeric() || c == '_') {
        return Err("username can only contain letters, numbers and underscores".to_string());
    }

    Ok(username)
}
