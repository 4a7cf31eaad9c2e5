//! Auth Configuration

use std::time::Duration;

use platform::cookie::{CookieConfig, SameSite};

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub session_cookie_name: String,
    /// HMAC key for session tokens
    pub session_secret: [u8; 32],
    /// Lifetime without "remember me"
    pub session_ttl_short: Duration,
    /// Lifetime with "remember me"
    pub session_ttl_long: Duration,
    pub cookie_secure: bool,
    pub cookie_same_site: SameSite,
    pub password_pepper: Option<Vec<u8>>,
    /// User name promoted to admin at startup
    pub bootstrap_admin: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_cookie_name: "sloboda_session".to_string(),
            session_secret: [0u8; 32],
            session_ttl_short: Duration::from_secs(12 * 3600),
            session_ttl_long: Duration::from_secs(7 * 24 * 3600),
            cookie_secure: true,
            cookie_same_site: SameSite::Lax,
            password_pepper: None,
            bootstrap_admin: None,
        }
    }
}

impl AuthConfig {
    pub fn with_random_secret() -> Self {
        Self {
            session_secret: platform::crypto::random_key(),
            ..Default::default()
        }
    }

    /// Random secret, insecure cookie
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            ..Self::with_random_secret()
        }
    }

    pub fn session_ttl(&self, remember_me: bool) -> Duration {
        if remember_me {
            self.session_ttl_long
        } else {
            self.session_ttl_short
        }
    }

    pub fn cookie(&self) -> CookieConfig {
        CookieConfig::new(
            self.session_cookie_name.clone(),
            self.cookie_secure,
            self.cookie_same_site,
        )
    }

    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }
}
