//! Value Objects

use crate::error::{CmsError, CmsResult};

fn bounded(value: &str, field: &str, min: usize, max: usize) -> CmsResult<String> {
    let value = value.trim();
    let len = value.chars().count();
    if len < min || len > max {
        return Err(CmsError::Validation(format!(
            "{field} must be {min}-{max} characters"
        )));
    }
    Ok(value.to_string())
}

/// Landing block key, e.g. `hero` or `join_us`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockKey(String);

impl BlockKey {
    pub fn new(value: &str) -> CmsResult<Self> {
        let value = value.trim();
        let valid = (2..=64).contains(&value.len())
            && value
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
        if !valid {
            return Err(CmsError::Validation(
                "Block key must be 2-64 characters of a-z, 0-9, '_' and '-'".to_string(),
            ));
        }
        Ok(Self(value.to_string()))
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

pub struct PostTitle(String);

impl PostTitle {
    pub fn new(value: &str) -> CmsResult<Self> {
        bounded(value, "Title", 3, 200).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Short teaser shown in lists
pub fn excerpt(value: &str) -> CmsResult<String> {
    bounded(value, "Excerpt", 0, 500)
}

/// Markdown source
pub fn markdown_body(value: &str) -> CmsResult<String> {
    bounded(value, "Body", 1, 100_000)
}

/// Absolute http(s) URL of the cover image; blank clears it
pub fn cover_url(value: &str) -> CmsResult<Option<String>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    let scheme_ok = value.starts_with("https://") || value.starts_with("http://");
    if !scheme_ok || value.len() > 2048 || value.chars().any(char::is_whitespace) {
        return Err(CmsError::Validation(
            "Cover image must be an http(s) URL".to_string(),
        ));
    }
    Ok(Some(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_key() {
        assert!(BlockKey::new("hero").is_ok());
        assert!(BlockKey::new("join_us-2").is_ok());
        assert!(BlockKey::new("h").is_err());
        assert!(BlockKey::new("Hero").is_err());
    }

    #[test]
    fn test_title_bounds() {
        assert!(PostTitle::new("Hi").is_err());
        assert_eq!(PostTitle::new("  News  ").unwrap().as_str(), "News");
    }

    #[test]
    fn test_cover_url() {
        assert_eq!(cover_url("  ").unwrap(), None);
        assert!(cover_url("https://cdn.example.org/a.png").unwrap().is_some());
        assert!(cover_url("javascript:alert(1)").is_err());
        assert!(cover_url("https://a b").is_err());
    }
}
