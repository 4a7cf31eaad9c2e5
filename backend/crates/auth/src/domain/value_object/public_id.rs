//! Public ID
//!
//! Members are addressed in URLs (`/api/forum/members/{public_id}`) by a
//! 21-character nanoid rather than their internal UUID.

use std::str::FromStr;

use kernel::error::app_error::{AppError, AppResult};
use nid::Nanoid;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicId(Nanoid);

impl PublicId {
    pub fn new() -> Self {
        Self(Nanoid::new())
    }

    pub fn parse_str(s: &str) -> AppResult<Self> {
        Nanoid::from_str(s)
            .map(Self)
            .map_err(|e| AppError::bad_request(format!("Invalid member id: {}", e)))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Default for PublicId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for PublicId {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        Self::parse_str(s)
    }
}

impl std::fmt::Display for PublicId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_has_default_length() {
        assert_eq!(PublicId::new().as_str().len(), 21);
    }

    #[test]
    fn test_parse() {
        let raw = "0123456789abcdefghi01";
        let id: PublicId = raw.parse().unwrap();
        assert_eq!(id.as_str(), raw);
        assert!(PublicId::parse_str("bad id!").is_err());
    }
}
