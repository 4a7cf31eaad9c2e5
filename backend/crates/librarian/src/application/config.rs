//! Librarian Configuration

use platform::rate_limit::RateLimitConfig;

#[derive(Debug, Clone)]
pub struct LibrarianConfig {
    /// Chat questions per user per day
    pub daily_questions: u32,
    /// Articles placed in the prompt
    pub max_context_articles: usize,
    /// Characters kept from each context article
    pub context_chars: usize,
    /// Earlier turns kept from the client's history
    pub history_turns: usize,
    /// Rows fetched for scoring
    pub candidate_limit: i64,
}

impl Default for LibrarianConfig {
    fn default() -> Self {
        Self {
            daily_questions: 30,
            max_context_articles: 3,
            context_chars: 2000,
            history_turns: 10,
            candidate_limit: 50,
        }
    }
}

impl LibrarianConfig {
    pub fn rate_limit(&self) -> RateLimitConfig {
        RateLimitConfig::per_day(self.daily_questions)
    }
}
