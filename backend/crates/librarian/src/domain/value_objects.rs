//! Value Objects

use crate::error::{LibrarianError, LibrarianResult};

pub const QUESTION_CHARS_MAX: usize = 2000;
const TAGS_MAX: usize = 10;
const TAG_CHARS_MAX: usize = 32;

fn bounded(value: &str, field: &str, min: usize, max: usize) -> LibrarianResult<String> {
    let value = value.trim();
    let len = value.chars().count();
    if len < min || len > max {
        return Err(LibrarianError::Validation(format!(
            "{field} must be {min}-{max} characters"
        )));
    }
    Ok(value.to_string())
}

pub fn article_title(value: &str) -> LibrarianResult<String> {
    bounded(value, "Title", 3, 200)
}

pub fn article_body(value: &str) -> LibrarianResult<String> {
    bounded(value, "Body", 1, 50_000)
}

/// Lowercased and deduplicated, in input order
pub fn tags(values: &[String]) -> LibrarianResult<Vec<String>> {
    let mut tags: Vec<String> = Vec::new();
    for value in values {
        let tag = value.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
        if tag.is_empty() {
            continue;
        }
        if tag.chars().count() > TAG_CHARS_MAX {
            return Err(LibrarianError::Validation(format!(
                "Tags must be at most {TAG_CHARS_MAX} characters"
            )));
        }
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    if tags.len() > TAGS_MAX {
        return Err(LibrarianError::Validation(format!(
            "At most {TAGS_MAX} tags"
        )));
    }
    Ok(tags)
}

pub fn question(value: &str) -> LibrarianResult<String> {
    bounded(value, "Question", 1, QUESTION_CHARS_MAX)
}

/// First `max` characters, cut on a char boundary
pub fn truncate_chars(value: &str, max: usize) -> &str {
    match value.char_indices().nth(max) {
        Some((idx, _)) => &value[..idx],
        None => value,
    }
}
