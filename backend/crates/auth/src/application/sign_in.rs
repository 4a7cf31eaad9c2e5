//! Sign In Use Case

use std::sync::Arc;

use platform::client::ClientFingerprint;
use platform::password::ClearTextPassword;

use crate::application::config::AuthConfig;
use crate::application::session_token;
use crate::domain::entity::{auth_session::AuthSession, user::User};
use crate::domain::repository::{AuthSessionRepository, CredentialRepository, UserRepository};
use crate::domain::value_object::user_name::UserName;
use crate::error::{AuthError, AuthResult};

pub struct SignInInput {
    pub user_name: String,
    pub password: String,
    pub remember_me: bool,
}

pub struct SignInOutput {
    /// Cookie value
    pub session_token: String,
    pub user: User,
}

pub struct SignInUseCase<U, C, S>
where
    U: UserRepository,
    C: CredentialRepository,
    S: AuthSessionRepository,
{
    user_repo: Arc<U>,
    credential_repo: Arc<C>,
    session_repo: Arc<S>,
    config: Arc<AuthConfig>,
}

impl<U, C, S> SignInUseCase<U, C, S>
where
    U: UserRepository,
    C: CredentialRepository,
    S: AuthSessionRepository,
{
    pub fn new(
        user_repo: Arc<U>,
        credential_repo: Arc<C>,
        session_repo: Arc<S>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            user_repo,
            credential_repo,
            session_repo,
            config,
        }
    }

    pub async fn execute(
        &self,
        input: SignInInput,
        fingerprint: ClientFingerprint,
    ) -> AuthResult<SignInOutput> {
        let user_name =
            UserName::new(&input.user_name).map_err(|_| AuthError::InvalidCredentials)?;

        let mut user = self
            .user_repo
            .find_by_user_name(&user_name)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.can_login() {
            return Err(AuthError::AccountDisabled);
        }

        let mut credential = self
            .credential_repo
            .find_by_user_id(&user.user_id)
            .await?
            .ok_or_else(|| AuthError::Internal("Credential row missing".to_string()))?;

        if credential.is_locked() {
            return Err(AuthError::AccountLocked);
        }

        let password = ClearTextPassword::for_verification(input.password);
        if !credential
            .password_hash
            .verify(&password, self.config.pepper())
        {
            credential.record_failure();
            self.credential_repo.update(&credential).await?;
            tracing::warn!(
                public_id = %user.public_id,
                locked = credential.is_locked(),
                "Failed sign-in"
            );
            return Err(AuthError::InvalidCredentials);
        }

        if credential.login_failed_count > 0 || credential.locked_until.is_some() {
            credential.reset_failures();
            self.credential_repo.update(&credential).await?;
        }

        user.record_login();
        self.user_repo.update(&user).await?;

        let ttl = chrono::Duration::from_std(self.config.session_ttl(input.remember_me))
            .map_err(|e| AuthError::Internal(format!("Invalid session TTL: {e}")))?;
        let session = AuthSession::new(user.user_id, input.remember_me, &fingerprint, ttl);
        self.session_repo.create(&session).await?;

        tracing::info!(
            public_id = %user.public_id,
            session_id = %session.session_id,
            remember_me = input.remember_me,
            "User signed in"
        );

        Ok(SignInOutput {
            session_token: session_token::issue(&self.config.session_secret, session.session_id),
            user,
        })
    }
}
