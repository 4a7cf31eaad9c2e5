//! Librarian Router
//!
//! Every route needs a session; article management and the chat log need
//! the `admin` role on top.

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

use crate::application::LibrarianConfig;
use crate::domain::model::LanguageModel;
use crate::domain::repository::LibrarianStore;
use crate::infra::http_model::HttpLanguageModel;
use crate::infra::postgres::PgLibrarianStore;
use crate::presentation::handlers::{self, LibrarianAppState};

/// Librarian routes backed by PostgreSQL and the HTTP model client
pub fn librarian_router(
    store: PgLibrarianStore,
    limiter: PgRateLimitStore,
    model: Option<HttpLanguageModel>,
    config: LibrarianConfig,
    auth: AuthMiddlewareState<PgAuthRepository>,
) -> Router {
    librarian_router_generic(store, limiter, model, config, auth)
}

pub fn librarian_router_generic<S, L, M, R>(
    store: S,
    limiter: L,
    model: Option<M>,
    config: LibrarianConfig,
    auth: AuthMiddlewareState<R>,
) -> Router
where
    S: LibrarianStore,
    L: RateLimitStore + Send + Sync + 'static,
    M: LanguageModel + Send + Sync + 'static,
    R: UserRepository + AuthSessionRepository + Send + Sync + 'static,
{
    let state = LibrarianAppState {
        store: Arc::new(store),
        limiter: Arc::new(limiter),
        model: model.map(Arc::new),
        config: Arc::new(config),
    };

    let members = Router::new()
        .route("/articles", get(handlers::list_articles::<S, L, M>))
        .route("/articles/{id}", get(handlers::get_article::<S, L, M>))
        .route("/search", get(handlers::search::<S, L, M>))
        .route("/chat", post(handlers::chat::<S, L, M>));

    let admins = Router::new()
        .route(
            "/admin/articles",
            get(handlers::admin_list_articles::<S, L, M>)
                .post(handlers::create_article::<S, L, M>),
        )
        .route(
            "/admin/articles/{id}",
            get(handlers::admin_get_article::<S, L, M>)
                .patch(handlers::update_article::<S, L, M>)
                .delete(handlers::delete_article::<S, L, M>),
        )
        .route("/admin/chats", get(handlers::list_chats::<S, L, M>))
        .route_layer(from_fn(|req: Request<Body>, next: Next| {
            require_role(UserRole::Admin, req, next)
        }));

    members
        .merge(admins)
        .route_layer(from_fn(move |req: Request<Body>, next: Next| {
            require_auth_session(auth.clone(), req, next)
        }))
        .with_state(state)
}
