//! Forum Router
//!
//! Four route groups: public reads, member actions behind a session,
//! moderator tools behind `moderator` and category management behind
//! `admin`. Use cases re-check the fine-grained permission either way.

use std::sync::Arc;

use auth::domain::repository::{AuthSessionRepository, UserRepository};
use auth::{AuthMiddlewareState, PgAuthRepository, UserRole, require_auth_session, require_role};
use axum::body::Body;
use axum::http::Request;
use axum::middleware::{Next, from_fn};
use axum::{
    Router,
    routing::{get, patch, post, put},
};

use crate::application::config::ForumConfig;
use crate::domain::repository::ForumStore;
use crate::infra::postgres::PgForumStore;
use crate::presentation::handlers::{self, ForumAppState};

/// Forum routes backed by PostgreSQL
pub fn forum_router(
    store: PgForumStore,
    auth: AuthMiddlewareState<PgAuthRepository>,
    config: ForumConfig,
) -> Router {
    forum_router_generic(store, auth, config)
}

/// Forum routes for any store implementation
pub fn forum_router_generic<S, R>(store: S, auth: AuthMiddlewareState<R>, config: ForumConfig) -> Router
where
    S: ForumStore,
    R: UserRepository + AuthSessionRepository + Send + Sync + 'static,
{
    let state = ForumAppState {
        store: Arc::new(store),
        config: Arc::new(config),
    };

    let public = Router::new()
        .route("/tiers", get(handlers::tiers))
        .route("/categories", get(handlers::list_categories::<S>))
        .route("/categories/{slug}/topics", get(handlers::list_topics::<S>))
        .route("/topics/{id}", get(handlers::get_topic::<S>))
        .route("/members/{public_id}", get(handlers::get_member::<S>));

    let members = Router::new()
        .route("/topics", post(handlers::create_topic::<S>))
        .route("/topics/{id}/posts", post(handlers::reply::<S>))
        .route("/topics/{id}/close", post(handlers::close_topic::<S>))
        .route(
            "/posts/{id}",
            patch(handlers::edit_post::<S>).delete(handlers::delete_post::<S>),
        )
        .route("/posts/{id}/vote", post(handlers::vote::<S>))
        .route("/posts/{id}/flag", post(handlers::flag::<S>))
        .route("/me/standing", get(handlers::my_standing::<S>))
        .route_layer(from_fn({
            let auth = auth.clone();
            move |req: Request<Body>, next: Next| require_auth_session(auth.clone(), req, next)
        }));

    let moderators = Router::new()
        .route("/mod/flags", get(handlers::list_flags::<S>))
        .route("/mod/flags/{id}/dismiss", post(handlers::dismiss_flag::<S>))
        .route("/mod/posts/{id}/hide", post(handlers::hide_post::<S>))
        .route("/mod/posts/{id}/restore", post(handlers::restore_post::<S>))
        .route("/mod/topics/{id}/lock", post(handlers::lock_topic::<S>))
        .route("/mod/topics/{id}/unlock", post(handlers::unlock_topic::<S>))
        .route("/mod/topics/{id}/pin", post(handlers::pin_topic::<S>))
        .route("/mod/topics/{id}/unpin", post(handlers::unpin_topic::<S>))
        .route("/mod/members/{public_id}/warn", post(handlers::warn_member::<S>))
        .route("/mod/members/{public_id}/ban", post(handlers::ban_member::<S>))
        .route("/mod/members/{public_id}/unban", post(handlers::unban_member::<S>))
        .route("/mod/members/{public_id}/role", put(handlers::change_role::<S>))
        .route("/mod/log", get(handlers::moderation_log::<S>))
        .route_layer(from_fn(|req: Request<Body>, next: Next| {
            require_role(UserRole::Moderator, req, next)
        }))
        .route_layer(from_fn({
            let auth = auth.clone();
            move |req: Request<Body>, next: Next| require_auth_session(auth.clone(), req, next)
        }));

    let admins = Router::new()
        .route("/admin/categories", post(handlers::create_category::<S>))
        .route("/admin/categories/{id}", put(handlers::update_category::<S>))
        .route_layer(from_fn(|req: Request<Body>, next: Next| {
            require_role(UserRole::Admin, req, next)
        }))
        .route_layer(from_fn(move |req: Request<Body>, next: Next| {
            require_auth_session(auth.clone(), req, next)
        }));

    public
        .merge(members)
        .merge(moderators)
        .merge(admins)
        .with_state(state)
}
