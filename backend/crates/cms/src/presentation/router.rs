//! CMS Router
//!
//! Public reads plus an `/admin` group behind the `admin` role.

use std::sync::Arc;

use auth::domain::repository::{AuthSessionRepository, UserRepository};
use auth::{AuthMiddlewareState, PgAuthRepository, UserRole, require_auth_session, require_role};
use axum::body::Body;
use axum::http::Request;
use axum::middleware::{Next, from_fn};
use axum::{
    Router,
    routing::{get, post, put},
};

use crate::domain::repository::CmsStore;
use crate::infra::postgres::PgCmsStore;
use crate::presentation::handlers::{self, CmsAppState};

/// CMS routes backed by PostgreSQL
pub fn cms_router(store: PgCmsStore, auth: AuthMiddlewareState<PgAuthRepository>) -> Router {
    cms_router_generic(store, auth)
}

/// CMS routes for any store implementation
pub fn cms_router_generic<S, R>(store: S, auth: AuthMiddlewareState<R>) -> Router
where
    S: CmsStore,
    R: UserRepository + AuthSessionRepository + Send + Sync + 'static,
{
    let state = CmsAppState {
        store: Arc::new(store),
    };

    let public = Router::new()
        .route("/landing", get(handlers::landing::<S>))
        .route("/posts", get(handlers::list_published::<S>))
        .route("/posts/{slug}", get(handlers::get_published::<S>));

    let admins = Router::new()
        .route("/admin/landing", get(handlers::admin_landing::<S>))
        .route("/admin/landing/{key}", put(handlers::put_landing_block::<S>))
        .route(
            "/admin/posts",
            get(handlers::admin_list::<S>).post(handlers::create_post::<S>),
        )
        .route(
            "/admin/posts/{id}",
            get(handlers::admin_get::<S>)
                .patch(handlers::update_post::<S>)
                .delete(handlers::delete_post::<S>),
        )
        .route("/admin/posts/{id}/publish", post(handlers::publish_post::<S>))
        .route("/admin/posts/{id}/unpublish", post(handlers::unpublish_post::<S>))
        .route_layer(from_fn(|req: Request<Body>, next: Next| {
            require_role(UserRole::Admin, req, next)
        }))
        .route_layer(from_fn(move |req: Request<Body>, next: Next| {
            require_auth_session(auth.clone(), req, next)
        }));

    public.merge(admins).with_state(state)
}
