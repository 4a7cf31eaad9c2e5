//! Periodic Cleanup
//!
//! Expired sessions and spent rate limit windows are deleted on a timer.
//! A failed sweep is logged and tried again on the next tick.

use std::future::Future;
use std::time::Duration;

use auth::PgAuthRepository;
use chrono::Utc;
use platform::rate_limit::PgRateLimitStore;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

/// Run `job` every `every`, the first time right away
pub fn spawn<F, Fut>(every: Duration, mut job: F) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            job().await;
        }
    })
}

pub async fn sweep(auth_repo: PgAuthRepository, rate_limits: PgRateLimitStore) {
    match auth_repo.cleanup_expired().await {
        Ok(sessions) => {
            tracing::info!(sessions_deleted = sessions, "Auth session cleanup completed");
        }
        Err(e) => {
            tracing::warn!(error = %e, "Auth session cleanup failed");
        }
    }

    match rate_limits.cleanup_expired(Utc::now()).await {
        Ok(deleted) => {
            tracing::info!(windows_deleted = deleted, "Rate limit cleanup completed");
        }
        Err(e) => {
            tracing::warn!(error = %e, "Rate limit cleanup failed");
        }
    }
}
