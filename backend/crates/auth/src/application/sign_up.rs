//! Sign Up Use Case

use std::sync::Arc;

use platform::password::ClearTextPassword;

use crate::application::config::AuthConfig;
use crate::domain::entity::{credential::Credential, user::User};
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{public_id::PublicId, user_name::UserName};
use crate::error::{AuthError, AuthResult};

pub struct SignUpInput {
    pub user_name: String,
    pub password: String,
}

pub struct SignUpOutput {
    pub public_id: PublicId,
    pub user_name: String,
}

pub struct SignUpUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    config: Arc<AuthConfig>,
}

impl<U> SignUpUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>, config: Arc<AuthConfig>) -> Self {
        Self { user_repo, config }
    }

    pub async fn execute(&self, input: SignUpInput) -> AuthResult<SignUpOutput> {
        let user_name =
            UserName::new(input.user_name).map_err(|e| AuthError::InvalidUserName(e.to_string()))?;

        if self.user_repo.exists_by_user_name(&user_name).await? {
            return Err(AuthError::UserNameTaken);
        }

        let password = ClearTextPassword::new(input.password)
            .map_err(|e| AuthError::PasswordValidation(e.to_string()))?;
        let password_hash = password
            .hash(self.config.pepper())
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        let user = User::new(user_name);
        let credential = Credential::new(user.user_id, password_hash);

        // The unique index still decides a race between two sign-ups
        self.user_repo.create(&user, &credential).await?;

        tracing::info!(
            public_id = %user.public_id,
            user_name = %user.user_name,
            "User signed up"
        );

        Ok(SignUpOutput {
            public_id: user.public_id,
            user_name: user.user_name.original().to_string(),
        })
    }
}
