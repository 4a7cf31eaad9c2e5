//! Auth Session Entity
//!
//! Server-side session row. The cookie carries only `session_id.signature`;
//! role and status are re-read from the user on every request.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::domain::value_object::user_id::UserId;

#[derive(Debug, Clone)]
pub struct AuthSession {
    pub session_id: Uuid,
    pub user_id: UserId,
    /// Unix timestamp (ms)
    pub expires_at_ms: i64,
    pub remember_me: bool,
    /// SHA-256 of the User-Agent that signed in
    pub client_fingerprint_hash: Vec<u8>,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

impl AuthSession {
    pub fn new(
        user_id: UserId,
        remember_me: bool,
        fingerprint: &platform::client::ClientFingerprint,
        ttl: Duration,
    ) -> Self {
        let now = Utc::now();
        Self {
            session_id: Uuid::new_v4(),
            user_id,
            expires_at_ms: (now + ttl).timestamp_millis(),
            remember_me,
            client_fingerprint_hash: fingerprint.hash_vec(),
            client_ip: fingerprint.ip_string(),
            user_agent: fingerprint.user_agent.clone(),
            created_at: now,
            last_activity_at: now,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp_millis() >= self.expires_at_ms
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn matches_fingerprint(&self, hash: &[u8]) -> bool {
        self.client_fingerprint_hash == hash
    }

    pub fn touch(&mut self) {
        self.last_activity_at = Utc::now();
    }

    /// Sliding expiry: once less than half of `ttl` remains, push the expiry
    /// out to `now + ttl`. Returns whether the session changed.
    pub fn extend_at(&mut self, now: DateTime<Utc>, ttl: Duration) -> bool {
        let half_mark = (now + ttl / 2).timestamp_millis();
        if self.expires_at_ms < half_mark {
            self.expires_at_ms = (now + ttl).timestamp_millis();
            true
        } else {
            false
        }
    }
}
