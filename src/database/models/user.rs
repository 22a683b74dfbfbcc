use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::application::UserJob;

/// Full users row. The password hash never leaves the service layer.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub photo_url: Option<String>,
    pub is_admin: bool,
}

/// Row shape of the user listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct UserSummary {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// What a user may see about an account: no hash, no admin flag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PublicUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub photo_url: Option<String>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            photo_url: user.photo_url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: PublicUser,
    pub jobs: Vec<UserJob>,
}

/// Registration payload; `password` is plain text until the service hashes it
#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub photo_url: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}
