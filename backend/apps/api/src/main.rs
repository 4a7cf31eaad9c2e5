//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors; the feature crates map their own
//! errors to responses.

mod config;
mod housekeeping;

use std::net::SocketAddr;
use std::sync::Arc;

use auth::application::bootstrap::promote_bootstrap_admin;
use auth::{AuthMiddlewareState, PgAuthRepository, auth_router};
use axum::{
    Router, http,
    http::{Method, header},
};
use cms::{PgCmsStore, cms_router};
use crm::{PgCrmStore, crm_router, registration_router};
use forum::{ForumConfig, PgForumStore, forum_router};
use librarian::{HttpLanguageModel, PgLibrarianStore, librarian_router};
use platform::rate_limit::PgRateLimitStore;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ApiConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "api=info,auth=info,forum=info,cms=info,crm=info,librarian=info,tower_http=info".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ApiConfig::from_env()?;

    // Database connection
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    // Periodic housekeeping; the first sweep runs right away
    let auth_repo = PgAuthRepository::new(pool.clone());
    let rate_limits = PgRateLimitStore::new(pool.clone());
    housekeeping::spawn(config.cleanup_interval, {
        let auth_repo = auth_repo.clone();
        let rate_limits = rate_limits.clone();
        move || housekeeping::sweep(auth_repo.clone(), rate_limits.clone())
    });

    if let Some(admin) = config.auth.bootstrap_admin.as_deref() {
        if let Err(e) = promote_bootstrap_admin(&auth_repo, admin).await {
            tracing::warn!(error = %e, "Bootstrap admin promotion failed");
        }
    }

    // Librarian model
    let model = match config.llm.clone() {
        Some(settings) => {
            let model = HttpLanguageModel::new(settings)?;
            tracing::info!(model = model.model_name(), "Librarian chat enabled");
            Some(model)
        }
        None => {
            tracing::info!("LLM_API_KEY not set, librarian chat disabled");
            None
        }
    };

    // CORS configuration
    let allowed_origins: Vec<http::HeaderValue> = config
        .frontend_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Build router
    let auth_state = AuthMiddlewareState::new(
        Arc::new(auth_repo.clone()),
        Arc::new(config.auth.clone()),
    );

    let app = Router::new()
        .nest("/api/auth", auth_router(auth_repo, config.auth.clone()))
        .nest(
            "/api/forum",
            forum_router(
                PgForumStore::new(pool.clone()),
                auth_state.clone(),
                ForumConfig::default(),
            ),
        )
        .nest(
            "/api/cms",
            cms_router(PgCmsStore::new(pool.clone()), auth_state.clone()),
        )
        .nest(
            "/api/registrations",
            registration_router(
                PgCrmStore::new(pool.clone()),
                rate_limits.clone(),
                config.crm.clone(),
            ),
        )
        .nest(
            "/api/crm",
            crm_router(PgCrmStore::new(pool.clone()), auth_state.clone()),
        )
        .nest(
            "/api/librarian",
            librarian_router(
                PgLibrarianStore::new(pool.clone()),
                rate_limits,
                model,
                config.librarian.clone(),
                auth_state,
            ),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    tracing::info!("Listening on {}", config.bind_addr);

    let listener = TcpListener::bind(config.bind_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
