//! Environment Configuration

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, bail};
use auth::AuthConfig;
use crm::CrmConfig;
use librarian::{LibrarianConfig, LlmSettings};

const DEFAULT_ORIGINS: &str = "http://localhost:40922,http://127.0.0.1:40922";

pub struct ApiConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub bind_addr: SocketAddr,
    pub frontend_origins: Vec<String>,
    /// How often expired sessions and rate limit windows are swept
    pub cleanup_interval: Duration,
    pub auth: AuthConfig,
    pub crm: CrmConfig,
    pub librarian: LibrarianConfig,
    /// `None` disables the librarian chat
    pub llm: Option<LlmSettings>,
}

fn var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parsed<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var(name) {
        Some(value) => value
            .parse()
            .with_context(|| format!("{name} has an invalid value: {value}")),
        None => Ok(default),
    }
}

fn session_secret() -> anyhow::Result<[u8; 32]> {
    let Some(secret_b64) = var("SESSION_SECRET") else {
        if cfg!(debug_assertions) {
            tracing::warn!("SESSION_SECRET not set, using a random key; sessions end on restart");
            return Ok(platform::crypto::random_key());
        }
        bail!("SESSION_SECRET must be set in production");
    };

    platform::crypto::key_from_base64(&secret_b64)
        .context("SESSION_SECRET must be base64 encoding exactly 32 bytes")
}

impl ApiConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = var("DATABASE_URL").context("DATABASE_URL must be set in environment")?;

        let frontend_origins = var("FRONTEND_ORIGINS")
            .unwrap_or_else(|| DEFAULT_ORIGINS.to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let auth = AuthConfig {
            session_secret: session_secret()?,
            cookie_secure: parsed("COOKIE_SECURE", !cfg!(debug_assertions))?,
            password_pepper: var("PASSWORD_PEPPER").map(String::into_bytes),
            bootstrap_admin: var("BOOTSTRAP_ADMIN"),
            ..AuthConfig::default()
        };

        let crm = CrmConfig {
            hourly_limit: parsed("REGISTRATION_HOURLY_LIMIT", CrmConfig::default().hourly_limit)?,
        };

        let librarian = LibrarianConfig {
            daily_questions: parsed(
                "LIBRARIAN_DAILY_QUESTIONS",
                LibrarianConfig::default().daily_questions,
            )?,
            ..LibrarianConfig::default()
        };

        let llm = var("LLM_API_KEY").map(|key| {
            let mut settings = LlmSettings::new(key);
            if let Some(url) = var("LLM_API_URL") {
                settings.api_url = url;
            }
            if let Some(model) = var("LLM_MODEL") {
                settings.model = model;
            }
            settings
        });

        Ok(Self {
            database_url,
            database_max_connections: parsed("DATABASE_MAX_CONNECTIONS", 5)?,
            bind_addr: parsed("BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 31113)))?,
            frontend_origins,
            cleanup_interval: Duration::from_secs(
                60 * parsed("CLEANUP_INTERVAL_MINUTES", 60u64)?.max(1),
            ),
            auth,
            crm,
            librarian,
            llm,
        })
    }
}
