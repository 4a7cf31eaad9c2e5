//! User Name
//!
//! The public handle used to sign in and shown on every forum post.
//!
//! Input is NFKC-normalised and trimmed; the original casing is kept for
//! display while the lowercase canonical form is what must be unique.
//!
//! Rules (checked on the canonical form):
//! - 3..=30 characters from `a-z 0-9 _ . -`
//! - starts and ends with a letter, digit or `_`
//! - no `..`, at least one letter or digit
//! - not a reserved word

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

pub const USER_NAME_MIN_LENGTH: usize = 3;
pub const USER_NAME_MAX_LENGTH: usize = 30;

const ALLOWED_SPECIAL_CHARS: &[char] = &['_', '.', '-'];

/// Names that would impersonate staff, collide with routes or confuse readers.
const RESERVED_WORDS: &[&str] = &[
    // staff
    "admin",
    "administrator",
    "root",
    "system",
    "moderator",
    "mod",
    "staff",
    "support",
    "sloboda",
    "official",
    // routes
    "api",
    "auth",
    "signin",
    "signout",
    "signup",
    "forum",
    "cms",
    "crm",
    "librarian",
    "registrations",
    "members",
    // ambiguous
    "null",
    "undefined",
    "anonymous",
    "guest",
    "deleted",
    "bot",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserNameError {
    #[error("User name cannot be empty")]
    Empty,

    #[error("User name is too short ({length} chars, minimum {min})")]
    TooShort { length: usize, min: usize },

    #[error("User name is too long ({length} chars, maximum {max})")]
    TooLong { length: usize, max: usize },

    #[error("Invalid character '{ch}' at position {position}; only a-z, 0-9, _, . and - are allowed")]
    InvalidCharacter { ch: char, position: usize },

    #[error("User name must start and end with a letter, digit or _")]
    InvalidEdge,

    #[error("User name cannot contain consecutive dots")]
    ConsecutiveDots,

    #[error("User name must contain at least one letter or digit")]
    NoAlphanumeric,

    #[error("'{0}' is a reserved user name")]
    Reserved(String),
}

#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserName {
    original: String,
    canonical: String,
}

impl UserName {
    pub fn new(input: impl AsRef<str>) -> Result<Self, UserNameError> {
        let original: String = input.as_ref().nfkc().collect::<String>().trim().to_string();
        let canonical = original.to_lowercase();
        validate(&canonical)?;
        Ok(Self {
            original,
            canonical,
        })
    }

    /// Rebuild from a stored value without re-running validation, so that
    /// tightening the rules never locks existing members out.
    pub fn from_db(original: impl Into<String>) -> Self {
        let original = original.into();
        let canonical = original.to_lowercase();
        Self {
            original,
            canonical,
        }
    }

    /// As typed (case preserved)
    #[inline]
    pub fn original(&self) -> &str {
        &self.original
    }

    /// Lowercase form used for uniqueness and lookups
    #[inline]
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    pub fn is_reserved(name: &str) -> bool {
        let canonical = name.nfkc().collect::<String>().trim().to_lowercase();
        RESERVED_WORDS.contains(&canonical.as_str())
    }
}

fn validate(canonical: &str) -> Result<(), UserNameError> {
    if canonical.is_empty() {
        return Err(UserNameError::Empty);
    }

    let length = canonical.chars().count();
    if length < USER_NAME_MIN_LENGTH {
        return Err(UserNameError::TooShort {
            length,
            min: USER_NAME_MIN_LENGTH,
        });
    }
    if length > USER_NAME_MAX_LENGTH {
        return Err(UserNameError::TooLong {
            length,
            max: USER_NAME_MAX_LENGTH,
        });
    }

    if let Some((position, ch)) = canonical
        .chars()
        .enumerate()
        .find(|(_, c)| !is_valid_char(*c))
    {
        return Err(UserNameError::InvalidCharacter { ch, position });
    }

    let edges_ok = canonical.chars().next().is_some_and(is_valid_edge_char)
        && canonical.chars().next_back().is_some_and(is_valid_edge_char);
    if !edges_ok {
        return Err(UserNameError::InvalidEdge);
    }

    if canonical.contains("..") {
        return Err(UserNameError::ConsecutiveDots);
    }

    if !canonical.chars().any(|c| c.is_ascii_alphanumeric()) {
        return Err(UserNameError::NoAlphanumeric);
    }

    if RESERVED_WORDS.contains(&canonical) {
        return Err(UserNameError::Reserved(canonical.to_string()));
    }

    Ok(())
}

#[inline]
fn is_valid_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || ALLOWED_SPECIAL_CHARS.contains(&c)
}

#[inline]
fn is_valid_edge_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'
}

impl fmt::Debug for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserName({})", self.original)
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl TryFrom<String> for UserName {
    type Error = UserNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserName> for String {
    fn from(name: UserName) -> Self {
        name.original
    }
}
