//! Auth Backend Module
//!
//! Accounts, sessions and the role ladder shared by every other crate.
//!
//! - `domain/` - entities, value objects, repository traits
//! - `application/` - use cases
//! - `infra/` - PostgreSQL implementations
//! - `presentation/` - handlers, DTOs, router, middleware
//!
//! ## Security model
//! - Argon2id password hashes with optional pepper
//! - Server-side sessions; the cookie holds `uuid.hmac`
//! - Sessions are bound to the User-Agent fingerprint
//! - Five consecutive failures lock an account for 15 minutes
//! - Every authenticated request reloads the user, so role changes and
//!   disabling take effect immediately

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;


pub use application::config::AuthConfig;
pub use domain::value_object::{
    public_id::PublicId, user_id::UserId, user_name::UserName, user_role::UserRole,
    user_status::UserStatus,
};
pub use error::{AuthError, AuthResult};
pub use infra::postgres::PgAuthRepository;
pub use presentation::middleware::{
    AuthMiddlewareState, CurrentUser, require_auth_session, require_role,
};
pub use presentation::router::auth_router;
