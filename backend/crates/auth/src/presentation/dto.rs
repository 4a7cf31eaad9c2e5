//! API DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entity::user::User;
use crate::domain::value_object::{user_role::UserRole, user_status::UserStatus};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub user_name: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpResponse {
    pub public_id: String,
    pub user_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    pub user_name: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusResponse {
    pub authenticated: bool,
    pub public_id: Option<String>,
    pub user_name: Option<String>,
    pub role: Option<UserRole>,
    pub expires_at_ms: Option<i64>,
}

impl SessionStatusResponse {
    pub fn anonymous() -> Self {
        Self {
            authenticated: false,
            public_id: None,
            user_name: None,
            role: None,
            expires_at_ms: None,
        }
    }
}

/// The signed-in user, as returned by sign-in and `/me`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub public_id: String,
    pub user_name: String,
    pub role: UserRole,
    pub role_title: &'static str,
    pub status: UserStatus,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            public_id: user.public_id.to_string(),
            user_name: user.user_name.original().to_string(),
            role: user.user_role,
            role_title: user.user_role.title(),
            status: user.user_status,
            last_login_at: user.last_login_at,
            created_at: user.created_at,
        }
    }
}
