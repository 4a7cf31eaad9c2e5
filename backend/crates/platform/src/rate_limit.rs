//! Rate Limiting
//!
//! Fixed-window counters keyed by an arbitrary bucket string
//! (`"signup:10.0.0.1"`, `"librarian:<user uuid>"`). Windows are aligned to
//! multiples of the window length since the Unix epoch.

use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

/// Rate limit configuration
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    /// Maximum requests allowed in the window
    pub max_requests: u32,
    /// Time window duration
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    pub fn per_hour(max_requests: u32) -> Self {
        Self::new(max_requests, 60 * 60)
    }

    pub fn per_day(max_requests: u32) -> Self {
        Self::new(max_requests, 24 * 60 * 60)
    }

    pub fn window_ms(&self) -> i64 {
        self.window.as_millis() as i64
    }

    /// Start of the window containing `now_ms`
    pub fn window_start_ms(&self, now_ms: i64) -> i64 {
        let window = self.window_ms().max(1);
        now_ms - now_ms.rem_euclid(window)
    }

    /// Decision for the `count`-th request (1-based) in the window starting at
    /// `window_start_ms`.
    pub fn decide(&self, count: u32, window_start_ms: i64) -> RateLimitDecision {
        RateLimitDecision {
            allowed: count <= self.max_requests,
            remaining: self.max_requests.saturating_sub(count),
            reset_at_ms: window_start_ms + self.window_ms(),
        }
    }
}

/// Rate limit check result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at_ms: i64,
}

impl RateLimitDecision {
    /// Seconds until the window resets, for `Retry-After`
    pub fn retry_after_secs(&self, now_ms: i64) -> u64 {
        let ms = (self.reset_at_ms - now_ms).max(0);
        (ms as u64).div_ceil(1000)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("Rate limit store error: {0}")]
    Store(#[from] sqlx::Error),
}

/// Counter storage backend
#[trait_variant::make(RateLimitStore: Send)]
pub trait LocalRateLimitStore {
    /// Count one request against `key` and report whether it is allowed.
    async fn check_and_increment(
        &self,
        key: &str,
        config: &RateLimitConfig,
    ) -> Result<RateLimitDecision, RateLimitError>;
}

// ============================================================================
// Postgres
// ============================================================================

#[derive(Clone)]
pub struct PgRateLimitStore {
    pool: PgPool,
}

impl PgRateLimitStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Delete windows that ended before `before`.
    pub async fn cleanup_expired(&self, before: DateTime<Utc>) -> Result<u64, RateLimitError> {
        let result = sqlx::query(
            r#"
            DELETE FROM rate_limits
            WHERE window_start_ms + window_ms < $1
            "#,
        )
        .bind(before.timestamp_millis())
        .execute(&self.pool)
        .await?;

        let deleted = result.rows_affected();
        if deleted > 0 {
            tracing::debug!(deleted, "Cleaned up expired rate limit windows");
        }
        Ok(deleted)
    }
}

impl RateLimitStore for PgRateLimitStore {
    async fn check_and_increment(
        &self,
        key: &str,
        config: &RateLimitConfig,
    ) -> Result<RateLimitDecision, RateLimitError> {
        let window_start_ms = config.window_start_ms(Utc::now().timestamp_millis());

        let count: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO rate_limits (bucket_key, window_start_ms, window_ms, request_count)
            VALUES ($1, $2, $3, 1)
            ON CONFLICT (bucket_key, window_start_ms)
            DO UPDATE SET request_count = rate_limits.request_count + 1
            RETURNING request_count
            "#,
        )
        .bind(key)
        .bind(window_start_ms)
        .bind(config.window_ms())
        .fetch_one(&self.pool)
        .await?;

        let decision = config.decide(count.max(0) as u32, window_start_ms);
        if !decision.allowed {
            tracing::debug!(bucket = %key, count, "Rate limit exceeded");
        }
        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_alignment() {
        let config = RateLimitConfig::new(5, 60);
        assert_eq!(config.window_start_ms(0), 0);
        assert_eq!(config.window_start_ms(59_999), 0);
        assert_eq!(config.window_start_ms(60_000), 60_000);
        assert_eq!(config.window_start_ms(125_000), 120_000);
    }

    #[test]
    fn test_decide() {
        let config = RateLimitConfig::new(2, 60);

        let first = config.decide(1, 60_000);
        assert!(first.allowed);
        assert_eq!(first.remaining, 1);
        assert_eq!(first.reset_at_ms, 120_000);

        let second = config.decide(2, 60_000);
        assert!(second.allowed);
        assert_eq!(second.remaining, 0);

        let third = config.decide(3, 60_000);
        assert!(!third.allowed);
        assert_eq!(third.remaining, 0);
    }

    #[test]
    fn test_retry_after_rounds_up() {
        let decision = RateLimitConfig::new(1, 60).decide(2, 0);
        assert_eq!(decision.retry_after_secs(59_001), 1);
        assert_eq!(decision.retry_after_secs(0), 60);
        assert_eq!(decision.retry_after_secs(70_000), 0);
    }

    #[test]
    fn test_per_day() {
        assert_eq!(RateLimitConfig::per_day(30).window_ms(), 86_400_000);
        assert_eq!(RateLimitConfig::per_hour(5).window_ms(), 3_600_000);
    }
}
