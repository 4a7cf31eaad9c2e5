//! Repository Traits
//!
//! Persistence interfaces; `infra::postgres` implements them, the crate tests
//! implement them in memory.

use uuid::Uuid;

use crate::domain::entity::{auth_session::AuthSession, credential::Credential, user::User};
use crate::domain::value_object::{
    public_id::PublicId, user_id::UserId, user_name::UserName, user_role::UserRole,
};
use crate::error::AuthResult;

#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Insert the user and its credential together. A taken name yields
    /// `AuthError::UserNameTaken`.
    async fn create(&self, user: &User, credential: &Credential) -> AuthResult<()>;

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>>;

    async fn find_by_public_id(&self, public_id: &PublicId) -> AuthResult<Option<User>>;

    /// Lookup by canonical name
    async fn find_by_user_name(&self, user_name: &UserName) -> AuthResult<Option<User>>;

    async fn exists_by_user_name(&self, user_name: &UserName) -> AuthResult<bool>;

    async fn update(&self, user: &User) -> AuthResult<()>;

    async fn set_role(&self, user_id: &UserId, role: UserRole) -> AuthResult<()>;
}

#[trait_variant::make(CredentialRepository: Send)]
pub trait LocalCredentialRepository {
    async fn find_by_user_id(&self, user_id: &UserId) -> AuthResult<Option<Credential>>;

    async fn update(&self, credential: &Credential) -> AuthResult<()>;
}

#[trait_variant::make(AuthSessionRepository: Send)]
pub trait LocalAuthSessionRepository {
    async fn create(&self, session: &AuthSession) -> AuthResult<()>;

    /// Unexpired session by id. Fingerprint checks are the caller's job.
    async fn find_by_id(&self, session_id: Uuid) -> AuthResult<Option<AuthSession>>;

    /// Persist `expires_at_ms` and `last_activity_at`
    async fn update(&self, session: &AuthSession) -> AuthResult<()>;

    async fn delete(&self, session_id: Uuid) -> AuthResult<()>;

    async fn delete_all_for_user(&self, user_id: &UserId) -> AuthResult<u64>;

    async fn cleanup_expired(&self) -> AuthResult<u64>;
}
