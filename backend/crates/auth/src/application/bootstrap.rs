//! Startup promotion of the first administrator

use crate::domain::repository::UserRepository;
use crate::domain::value_object::{user_name::UserName, user_role::UserRole};
use crate::error::AuthResult;

/// Make `user_name` an admin if it exists and is not one already.
/// Returns whether the role changed.
pub async fn promote_bootstrap_admin<U>(repo: &U, user_name: &str) -> AuthResult<bool>
where
    U: UserRepository,
{
    // Lookup only; the configured name may be a reserved word such as "admin"
    let name = UserName::from_db(user_name.trim());

    let Some(user) = repo.find_by_user_name(&name).await? else {
        tracing::warn!(user_name = %name, "Bootstrap admin has not signed up yet");
        return Ok(false);
    };

    if user.user_role == UserRole::Admin {
        return Ok(false);
    }

    repo.set_role(&user.user_id, UserRole::Admin).await?;
    tracing::info!(
        public_id = %user.public_id,
        previous_role = %user.user_role,
        "Bootstrap admin promoted"
    );
    Ok(true)
}
