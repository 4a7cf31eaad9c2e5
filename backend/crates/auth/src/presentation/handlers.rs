//! HTTP Handlers

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use platform::client::{extract_client_ip, extract_fingerprint};
use platform::cookie::extract_cookie;

use crate::application::config::AuthConfig;
use crate::application::{
    CheckSessionUseCase, SignInInput, SignInUseCase, SignOutUseCase, SignUpInput, SignUpUseCase,
};
use crate::domain::repository::{AuthSessionRepository, CredentialRepository, UserRepository};
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    SessionStatusResponse, SignInRequest, SignUpRequest, SignUpResponse, UserResponse,
};

#[derive(Clone)]
pub struct AuthAppState<R>
where
    R: UserRepository + CredentialRepository + AuthSessionRepository + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub config: Arc<AuthConfig>,
}

/// POST /api/auth/signup
pub async fn sign_up<R>(
    State(state): State<AuthAppState<R>>,
    Json(req): Json<SignUpRequest>,
) -> AuthResult<(StatusCode, Json<SignUpResponse>)>
where
    R: UserRepository + CredentialRepository + AuthSessionRepository + Clone + Send + Sync + 'static,
{
    let use_case = SignUpUseCase::new(state.repo.clone(), state.config.clone());

    let output = use_case
        .execute(SignUpInput {
            user_name: req.user_name,
            password: req.password,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SignUpResponse {
            public_id: output.public_id.to_string(),
            user_name: output.user_name,
        }),
    ))
}

/// POST /api/auth/signin
pub async fn sign_in<R>(
    State(state): State<AuthAppState<R>>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(req): Json<SignInRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: UserRepository + CredentialRepository + AuthSessionRepository + Clone + Send + Sync + 'static,
{
    let client_ip = extract_client_ip(&headers, Some(addr.ip()));
    let fingerprint = extract_fingerprint(&headers, client_ip)?;

    let use_case = SignInUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.config.clone(),
    );

    let remember_me = req.remember_me;
    let output = use_case
        .execute(
            SignInInput {
                user_name: req.user_name,
                password: req.password,
                remember_me,
            },
            fingerprint,
        )
        .await?;

    // Max-Age follows the session lifetime
    let cookie = state
        .config
        .cookie()
        .set_cookie_header(&output.session_token, state.config.session_ttl(remember_me));

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(UserResponse::from(&output.user)),
    ))
}

/// POST /api/auth/signout
pub async fn sign_out<R>(
    State(state): State<AuthAppState<R>>,
    headers: HeaderMap,
) -> impl IntoResponse
where
    R: UserRepository + CredentialRepository + AuthSessionRepository + Clone + Send + Sync + 'static,
{
    if let Some(token) = extract_cookie(&headers, &state.config.session_cookie_name) {
        let use_case = SignOutUseCase::new(state.repo.clone(), state.config.clone());
        // The cookie is cleared either way
        if let Err(e) = use_case.execute(&token).await {
            tracing::debug!(error = %e, "Sign-out with unusable session token");
        }
    }

    (
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, state.config.cookie().delete_cookie_header())],
    )
}

/// GET /api/auth/status
pub async fn session_status<R>(
    State(state): State<AuthAppState<R>>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> AuthResult<Json<SessionStatusResponse>>
where
    R: UserRepository + CredentialRepository + AuthSessionRepository + Clone + Send + Sync + 'static,
{
    let client_ip = extract_client_ip(&headers, Some(addr.ip()));
    let fingerprint = extract_fingerprint(&headers, client_ip)?;

    let Some(token) = extract_cookie(&headers, &state.config.session_cookie_name) else {
        return Ok(Json(SessionStatusResponse::anonymous()));
    };

    let use_case = CheckSessionUseCase::new(state.repo.clone(), state.config.clone());
    let response = match use_case.execute(&token, &fingerprint.hash).await {
        Ok(ctx) => SessionStatusResponse {
            authenticated: true,
            public_id: Some(ctx.user.public_id.to_string()),
            user_name: Some(ctx.user.user_name.original().to_string()),
            role: Some(ctx.user.user_role),
            expires_at_ms: Some(ctx.session.expires_at_ms),
        },
        Err(AuthError::Database(e)) => return Err(AuthError::Database(e)),
        Err(_) => SessionStatusResponse::anonymous(),
    };

    Ok(Json(response))
}

/// GET /api/auth/me
pub async fn me<R>(
    State(state): State<AuthAppState<R>>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> AuthResult<Json<UserResponse>>
where
    R: UserRepository + CredentialRepository + AuthSessionRepository + Clone + Send + Sync + 'static,
{
    let client_ip = extract_client_ip(&headers, Some(addr.ip()));
    let fingerprint = extract_fingerprint(&headers, client_ip)?;

    let token = extract_cookie(&headers, &state.config.session_cookie_name)
        .ok_or(AuthError::SessionInvalid)?;

    let use_case = CheckSessionUseCase::new(state.repo.clone(), state.config.clone());
    let ctx = use_case.execute(&token, &fingerprint.hash).await?;

    Ok(Json(UserResponse::from(&ctx.user)))
}
