//! Domain Value Objects
//!
//! Validated inputs. Constructors trim, check bounds and hand back a
//! `ForumError::Validation` with a readable message.

use crate::error::{ForumError, ForumResult};

pub const TOPIC_TITLE_MIN: usize = 3;
pub const TOPIC_TITLE_MAX: usize = 150;
pub const POST_BODY_MAX: usize = 20_000;
pub const REASON_MAX: usize = 500;
pub const BAN_DAYS_MAX: u32 = 3650;

pub(crate) fn bounded(value: &str, field: &str, min: usize, max: usize) -> ForumResult<String> {
    let trimmed = value.trim();
    let length = trimmed.chars().count();
    if length < min {
        return Err(ForumError::Validation(if min == 1 {
            format!("{field} cannot be empty")
        } else {
            format!("{field} must be at least {min} characters")
        }));
    }
    if length > max {
        return Err(ForumError::Validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(trimmed.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicTitle(String);

impl TopicTitle {
    pub fn new(value: &str) -> ForumResult<Self> {
        bounded(value, "Title", TOPIC_TITLE_MIN, TOPIC_TITLE_MAX).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostBody(String);

impl PostBody {
    pub fn new(value: &str) -> ForumResult<Self> {
        bounded(value, "Post", 1, POST_BODY_MAX).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Moderation or flag reason
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reason(String);

impl Reason {
    pub fn new(value: &str) -> ForumResult<Self> {
        bounded(value, "Reason", 3, REASON_MAX).map(Self)
    }

    /// Blank input means no reason given
    pub fn optional(value: Option<&str>) -> ForumResult<Option<Self>> {
        match value.map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => Self::new(value).map(Some),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// `+1`, `-1`, or `0` to withdraw a vote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteValue(i16);

impl VoteValue {
    pub fn new(value: i16) -> ForumResult<Self> {
        match value {
            -1..=1 => Ok(Self(value)),
            _ => Err(ForumError::Validation(
                "Vote must be 1, -1 or 0".to_string(),
            )),
        }
    }

    pub fn value(&self) -> i16 {
        self.0
    }

    pub fn is_none(&self) -> bool {
        self.0 == 0
    }
}

/// Ban length; absent means until lifted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BanDays(u32);

impl BanDays {
    pub fn new(days: u32, max: u32) -> ForumResult<Self> {
        let max = max.min(BAN_DAYS_MAX);
        if !(1..=max).contains(&days) {
            return Err(ForumError::Validation(format!(
                "Ban length must be between 1 and {max} days"
            )));
        }
        Ok(Self(days))
    }

    pub fn days(&self) -> u32 {
        self.0
    }

    pub fn duration(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.0))
    }
}

/// Category slug: `a-z`, digits and single dashes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySlug(String);

impl CategorySlug {
    pub fn new(value: &str) -> ForumResult<Self> {
        let slug = value.trim().to_lowercase();
        let valid_chars = slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        let length = slug.chars().count();
        if !(2..=64).contains(&length)
            || !valid_chars
            || slug.starts_with('-')
            || slug.ends_with('-')
            || slug.contains("--")
        {
            return Err(ForumError::Validation(
                "Slug must be 2-64 characters of a-z, 0-9 and single dashes".to_string(),
            ));
        }
        Ok(Self(slug))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}
