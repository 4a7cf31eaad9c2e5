//! Credential Entity
//!
//! Password hash and brute-force counters, kept apart from [`User`] so that
//! profile reads never touch secret material.
//!
//! [`User`]: super::user::User

use chrono::{DateTime, Duration, Utc};
use platform::password::HashedPassword;

use crate::domain::value_object::user_id::UserId;

#[derive(Debug, Clone)]
pub struct Credential {
    pub user_id: UserId,
    pub password_hash: HashedPassword,
    /// Consecutive failures since the last successful sign-in
    pub login_failed_count: u16,
    pub last_failed_at: Option<DateTime<Utc>>,
    pub locked_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Credential {
    pub const MAX_LOGIN_FAILURES: u16 = 5;
    pub const LOCKOUT_MINUTES: i64 = 15;

    pub fn new(user_id: UserId, password_hash: HashedPassword) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            password_hash,
            login_failed_count: 0,
            last_failed_at: None,
            locked_until: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_locked_at(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| now < until)
    }

    pub fn is_locked(&self) -> bool {
        self.is_locked_at(Utc::now())
    }

    /// Count a failed attempt; the fifth in a row locks the account.
    pub fn record_failure_at(&mut self, now: DateTime<Utc>) {
        self.login_failed_count = self.login_failed_count.saturating_add(1);
        self.last_failed_at = Some(now);
        self.updated_at = now;

        if self.login_failed_count >= Self::MAX_LOGIN_FAILURES {
            self.locked_until = Some(now + Duration::minutes(Self::LOCKOUT_MINUTES));
            self.login_failed_count = 0;
        }
    }

    pub fn record_failure(&mut self) {
        self.record_failure_at(Utc::now());
    }

    pub fn reset_failures(&mut self) {
        self.login_failed_count = 0;
        self.last_failed_at = None;
        self.locked_until = None;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::password::ClearTextPassword;

    fn credential() -> Credential {
        let hash = ClearTextPassword::new("Correct-Horse-7".into())
            .unwrap()
            .hash(None)
            .unwrap();
        Credential::new(UserId::new(), hash)
    }

    #[test]
    fn test_lockout_after_five_failures() {
        let mut cred = credential();
        let now = Utc::now();

        for _ in 0..4 {
            cred.record_failure_at(now);
            assert!(!cred.is_locked_at(now));
        }
        cred.record_failure_at(now);

        assert!(cred.is_locked_at(now));
        assert!(cred.is_locked_at(now + Duration::minutes(14)));
        assert!(!cred.is_locked_at(now + Duration::minutes(15)));
    }

    #[test]
    fn test_reset_clears_lock() {
        let mut cred = credential();
        let now = Utc::now();
        for _ in 0..5 {
            cred.record_failure_at(now);
        }
        cred.reset_failures();
        assert!(!cred.is_locked_at(now));
        assert_eq!(cred.login_failed_count, 0);
    }
}
