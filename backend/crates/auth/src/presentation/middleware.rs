//! Auth Middleware
//!
//! `require_auth_session` resolves the session cookie and stores a
//! [`CurrentUser`] in the request extensions; `require_role` then gates on it.
//!
//! ```ignore
//! Router::new()
//!     .route("/mod/log", get(list_log))
//!     .route_layer(from_fn(|req: Request<Body>, next: Next| {
//!         require_role(UserRole::Moderator, req, next)
//!     }))
//!     .route_layer(from_fn(move |req: Request<Body>, next: Next| {
//!         require_auth_session(auth.clone(), req, next)
//!     }));
//! ```

use std::sync::Arc;

use axum::body::Body;
use axum::extract::FromRequestParts;
use axum::http::Request;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use platform::client::{extract_fingerprint, request_client_ip};
use platform::cookie::extract_cookie;
use uuid::Uuid;

use crate::application::CheckSessionUseCase;
use crate::application::config::AuthConfig;
use crate::domain::repository::{AuthSessionRepository, UserRepository};
use crate::domain::value_object::{
    public_id::PublicId, user_id::UserId, user_role::UserRole,
};
use crate::error::AuthError;

pub struct AuthMiddlewareState<R>
where
    R: UserRepository + AuthSessionRepository + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub config: Arc<AuthConfig>,
}

// Manual impl: only the `Arc` is cloned, `R` need not be `Clone`.
impl<R> Clone for AuthMiddlewareState<R>
where
    R: UserRepository + AuthSessionRepository + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            config: self.config.clone(),
        }
    }
}

impl<R> AuthMiddlewareState<R>
where
    R: UserRepository + AuthSessionRepository + Send + Sync + 'static,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }
}

/// The authenticated member making the request, loaded fresh per request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: UserId,
    pub public_id: PublicId,
    pub user_name: String,
    pub role: UserRole,
    pub session_id: Uuid,
}

impl CurrentUser {
    pub fn has_role(&self, min: UserRole) -> bool {
        self.role >= min
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(AuthError::SessionInvalid)
    }
}

pub async fn require_auth_session<R>(
    state: AuthMiddlewareState<R>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError>
where
    R: UserRepository + AuthSessionRepository + Send + Sync + 'static,
{
    let client_ip = request_client_ip(&req);
    let fingerprint = extract_fingerprint(req.headers(), client_ip)?;

    let token = extract_cookie(req.headers(), &state.config.session_cookie_name)
        .ok_or(AuthError::SessionInvalid)?;

    let use_case = CheckSessionUseCase::new(state.repo.clone(), state.config.clone());
    let ctx = use_case.execute(&token, &fingerprint.hash).await?;

    req.extensions_mut().insert(CurrentUser {
        user_id: ctx.user.user_id,
        public_id: ctx.user.public_id,
        user_name: ctx.user.user_name.original().to_string(),
        role: ctx.user.user_role,
        session_id: ctx.session.session_id,
    });

    Ok(next.run(req).await)
}

/// Must run after [`require_auth_session`].
pub async fn require_role(
    min_role: UserRole,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let user = req
        .extensions()
        .get::<CurrentUser>()
        .ok_or(AuthError::SessionInvalid)?;

    if !user.has_role(min_role) {
        tracing::debug!(
            public_id = %user.public_id,
            role = %user.role,
            required = %min_role,
            "Role check failed"
        );
        return Err(AuthError::InsufficientRole { required: min_role });
    }

    Ok(next.run(req).await)
}
