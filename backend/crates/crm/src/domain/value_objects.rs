//! Intake Field Validation
//!
//! Each function trims, checks and normalises one form field.

use crate::error::{CrmError, CrmResult};

pub const INTERESTS_MAX: usize = 10;
const INTEREST_CHARS_MAX: usize = 50;

fn invalid(message: impl Into<String>) -> CrmError {
    CrmError::Validation(message.into())
}

fn optional(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub fn full_name(value: &str) -> CrmResult<String> {
    let value = value.split_whitespace().collect::<Vec<_>>().join(" ");
    let len = value.chars().count();
    if !(2..=120).contains(&len) {
        return Err(invalid("Full name must be 2-120 characters"));
    }
    if value.chars().any(char::is_control) {
        return Err(invalid("Full name contains invalid characters"));
    }
    Ok(value)
}

/// Lowercased address with one `@` and a dotted domain
pub fn email(value: &str) -> CrmResult<String> {
    let value = value.trim().to_lowercase();
    let err = || invalid("Email address is not valid");

    if value.len() > 254 || value.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(err());
    }
    let (local, domain) = value.split_once('@').ok_or_else(err)?;
    let domain_ok = domain.contains('.')
        && !domain.contains('@')
        && !domain.starts_with(['.', '-'])
        && !domain.ends_with(['.', '-'])
        && !domain.contains("..")
        && domain
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-');
    if local.is_empty() || local.len() > 64 || !domain_ok {
        return Err(err());
    }
    Ok(value)
}

/// Digits with the usual separators; 5-20 digits
pub fn phone(value: Option<&str>) -> CrmResult<Option<String>> {
    let Some(value) = optional(value) else {
        return Ok(None);
    };
    let allowed = value
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'));
    let digits = value.chars().filter(char::is_ascii_digit).count();
    if !allowed || !(5..=20).contains(&digits) || value.len() > 32 {
        return Err(invalid("Phone number is not valid"));
    }
    Ok(Some(value.to_string()))
}

pub fn city(value: Option<&str>) -> CrmResult<Option<String>> {
    let Some(value) = optional(value) else {
        return Ok(None);
    };
    if value.chars().count() > 100 {
        return Err(invalid("City must be at most 100 characters"));
    }
    Ok(Some(value.to_string()))
}

/// Trimmed, blank entries dropped, duplicates removed case-insensitively
pub fn interests(values: &[String]) -> CrmResult<Vec<String>> {
    let mut out: Vec<String> = Vec::new();
    for value in values.iter().map(|v| v.trim()).filter(|v| !v.is_empty()) {
        if value.chars().count() > INTEREST_CHARS_MAX {
            return Err(invalid(format!(
                "Each interest must be at most {INTEREST_CHARS_MAX} characters"
            )));
        }
        if !out.iter().any(|o| o.to_lowercase() == value.to_lowercase()) {
            out.push(value.to_string());
        }
    }
    if out.len() > INTERESTS_MAX {
        return Err(invalid(format!("At most {INTERESTS_MAX} interests")));
    }
    Ok(out)
}

pub fn message(value: Option<&str>) -> CrmResult<String> {
    let value = value.map(str::trim).unwrap_or_default();
    if value.chars().count() > 2000 {
        return Err(invalid("Message must be at most 2000 characters"));
    }
    Ok(value.to_string())
}

/// Campaign tag such as `vk_ads`; lowercased
pub fn source(value: Option<&str>) -> CrmResult<Option<String>> {
    let Some(value) = optional(value) else {
        return Ok(None);
    };
    let value = value.to_lowercase();
    let valid = value.len() <= 64
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid {
        return Err(invalid("Source must be up to 64 characters of a-z, 0-9, '_' and '-'"));
    }
    Ok(Some(value))
}

/// Admin note text
pub fn note_body(value: &str) -> CrmResult<String> {
    let value = value.trim();
    let len = value.chars().count();
    if !(1..=4000).contains(&len) {
        return Err(invalid("Note must be 1-4000 characters"));
    }
    Ok(value.to_string())
}
