//! User Entity

use chrono::{DateTime, Utc};

use crate::domain::value_object::{
    public_id::PublicId, user_id::UserId, user_name::UserName, user_role::UserRole,
    user_status::UserStatus,
};

/// Account profile. Password material lives in [`Credential`].
///
/// [`Credential`]: super::credential::Credential
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: UserId,
    pub public_id: PublicId,
    pub user_name: UserName,
    pub user_role: UserRole,
    pub user_status: UserStatus,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// New accounts start at the bottom of the ladder.
    pub fn new(user_name: UserName) -> Self {
        let now = Utc::now();
        Self {
            user_id: UserId::new(),
            public_id: PublicId::new(),
            user_name,
            user_role: UserRole::Newcomer,
            user_status: UserStatus::Active,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn record_login(&mut self) {
        let now = Utc::now();
        self.last_login_at = Some(now);
        self.updated_at = now;
    }

    pub fn can_login(&self) -> bool {
        self.user_status.can_login()
    }

    pub fn set_role(&mut self, role: UserRole) {
        self.user_role = role;
        self.updated_at = Utc::now();
    }

    pub fn set_status(&mut self, status: UserStatus) {
        self.user_status = status;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_is_active_newcomer() {
        let user = User::new(UserName::new("olga").unwrap());
        assert_eq!(user.user_role, UserRole::Newcomer);
        assert!(user.can_login());
        assert!(user.last_login_at.is_none());
    }

    #[test]
    fn test_disabled_user_cannot_login() {
        let mut user = User::new(UserName::new("olga").unwrap());
        user.set_status(UserStatus::Disabled);
        assert!(!user.can_login());
    }
}
