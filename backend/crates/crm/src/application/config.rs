//! CRM Configuration

use platform::rate_limit::RateLimitConfig;

#[derive(Debug, Clone)]
pub struct CrmConfig {
    /// Registrations accepted per client IP per hour
    pub hourly_limit: u32,
}

impl Default for CrmConfig {
    fn default() -> Self {
        Self { hourly_limit: 5 }
    }
}

impl CrmConfig {
    pub fn rate_limit(&self) -> RateLimitConfig {
        RateLimitConfig::per_hour(self.hourly_limit)
    }
}
