//! Forum Configuration

use crate::domain::value_objects::BAN_DAYS_MAX;

#[derive(Debug, Clone)]
pub struct ForumConfig {
    /// Open flags that hide a post automatically
    pub auto_hide_flag_threshold: i64,
    /// Reputation taken by a moderator warning
    pub warning_reputation_penalty: i32,
    pub max_ban_days: u32,
}

impl Default for ForumConfig {
    fn default() -> Self {
        Self {
            auto_hide_flag_threshold: 3,
            warning_reputation_penalty: 5,
            max_ban_days: BAN_DAYS_MAX,
        }
    }
}
