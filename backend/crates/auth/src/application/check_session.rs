//! Check Session Use Case
//!
//! Resolves a session cookie to the live user behind it.

use std::sync::Arc;

use chrono::Utc;

use crate::application::config::AuthConfig;
use crate::application::session_token;
use crate::domain::entity::{auth_session::AuthSession, user::User};
use crate::domain::repository::{AuthSessionRepository, UserRepository};
use crate::error::{AuthError, AuthResult};

/// A validated session and its freshly loaded user
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session: AuthSession,
    pub user: User,
}

pub struct CheckSessionUseCase<R>
where
    R: UserRepository + AuthSessionRepository + Send + Sync + 'static,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
}

impl<R> CheckSessionUseCase<R>
where
    R: UserRepository + AuthSessionRepository + Send + Sync + 'static,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn execute(
        &self,
        session_token: &str,
        fingerprint_hash: &[u8],
    ) -> AuthResult<SessionContext> {
        let session_id = session_token::parse(&self.config.session_secret, session_token)?;

        let mut session = AuthSessionRepository::find_by_id(&*self.repo, session_id)
            .await?
            .ok_or(AuthError::SessionInvalid)?;

        if session.is_expired() {
            AuthSessionRepository::delete(&*self.repo, session_id).await?;
            return Err(AuthError::SessionInvalid);
        }

        if !session.matches_fingerprint(fingerprint_hash) {
            tracing::warn!(session_id = %session_id, "Auth session fingerprint mismatch");
            return Err(AuthError::SessionFingerprintMismatch);
        }

        // Role and status can change mid-session
        let user = UserRepository::find_by_id(&*self.repo, &session.user_id)
            .await?
            .ok_or(AuthError::SessionInvalid)?;

        if !user.can_login() {
            AuthSessionRepository::delete_all_for_user(&*self.repo, &user.user_id).await?;
            return Err(AuthError::AccountDisabled);
        }

        session.touch();
        let ttl = chrono::Duration::from_std(self.config.session_ttl(session.remember_me))
            .map_err(|e| AuthError::Internal(format!("Invalid session TTL: {e}")))?;
        session.extend_at(Utc::now(), ttl);

        let repo = self.repo.clone();
        let to_save = session.clone();
        tokio::spawn(async move {
            if let Err(e) = AuthSessionRepository::update(&*repo, &to_save).await {
                tracing::warn!(error = %e, "Failed to update session activity");
            }
        });

        Ok(SessionContext { session, user })
    }
}
