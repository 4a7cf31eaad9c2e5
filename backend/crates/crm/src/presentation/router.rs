//! CRM Router
//!
//! The public intake form is mounted separately from the admin pipeline so
//! the two can live under different prefixes.

use std::sync::Arc;

use auth::domain::repository::{AuthSessionRepository, UserRepository};
use auth::{AuthMiddlewareState, PgAuthRepository, UserRole, require_auth_session, require_role};
use axum::body::Body;
use axum::http::Request;
use axum::middleware::{Next, from_fn};
use axum::{
    Router,
    routing::{get, post},
};
use platform::rate_limit::{PgRateLimitStore, RateLimitStore};

use crate::application::config::CrmConfig;
use crate::domain::repository::CrmStore;
use crate::infra::postgres::PgCrmStore;
use crate::presentation::handlers::{self, CrmAppState, IntakeAppState};

/// Public registration form backed by PostgreSQL
pub fn registration_router(
    store: PgCrmStore,
    limiter: PgRateLimitStore,
    config: CrmConfig,
) -> Router {
    registration_router_generic(store, limiter, config)
}

pub fn registration_router_generic<S, L>(store: S, limiter: L, config: CrmConfig) -> Router
where
    S: CrmStore,
    L: RateLimitStore + Send + Sync + 'static,
{
    let state = IntakeAppState {
        store: Arc::new(store),
        limiter: Arc::new(limiter),
        config: Arc::new(config),
    };

    Router::new()
        .route("/", post(handlers::submit::<S, L>))
        .with_state(state)
}

/// Admin pipeline backed by PostgreSQL
pub fn crm_router(store: PgCrmStore, auth: AuthMiddlewareState<PgAuthRepository>) -> Router {
    crm_router_generic(store, auth)
}

pub fn crm_router_generic<S, R>(store: S, auth: AuthMiddlewareState<R>) -> Router
where
    S: CrmStore,
    R: UserRepository + AuthSessionRepository + Send + Sync + 'static,
{
    let state = CrmAppState {
        store: Arc::new(store),
    };

    Router::new()
        .route("/registrations", get(handlers::list_registrations::<S>))
        .route("/registrations/{id}", get(handlers::get_registration::<S>))
        .route(
            "/registrations/{id}/status",
            post(handlers::change_status::<S>).put(handlers::change_status::<S>),
        )
        .route("/registrations/{id}/notes", post(handlers::add_note::<S>))
        .route("/stats", get(handlers::stats::<S>))
        .route_layer(from_fn(|req: Request<Body>, next: Next| {
            require_role(UserRole::Admin, req, next)
        }))
        .route_layer(from_fn(move |req: Request<Body>, next: Next| {
            require_auth_session(auth.clone(), req, next)
        }))
        .with_state(state)
}
