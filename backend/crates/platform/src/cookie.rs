//! Cookie Management

use std::time::Duration;

use axum::http::{HeaderMap, HeaderValue, header};

/// SameSite policy for cookies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    Strict,
    #[default]
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// Attributes shared by every value of one cookie
#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub name: String,
    pub secure: bool,
    pub same_site: SameSite,
    pub path: String,
}

impl CookieConfig {
    pub fn new(name: impl Into<String>, secure: bool, same_site: SameSite) -> Self {
        Self {
            name: name.into(),
            secure,
            same_site,
            path: "/".to_string(),
        }
    }

    fn attributes(&self) -> String {
        let mut attrs = format!("; HttpOnly; Path={}", self.path);
        if self.secure {
            attrs.push_str("; Secure");
        }
        attrs.push_str("; SameSite=");
        attrs.push_str(self.same_site.as_str());
        attrs
    }

    /// `Set-Cookie` value carrying `value` for `max_age`
    pub fn build_set_cookie(&self, value: &str, max_age: Duration) -> String {
        format!(
            "{}={}{}; Max-Age={}",
            self.name,
            value,
            self.attributes(),
            max_age.as_secs()
        )
    }

    /// `Set-Cookie` value that expires the cookie immediately
    pub fn build_delete_cookie(&self) -> String {
        format!(
            "{}={}; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT",
            self.name,
            self.attributes()
        )
    }

    pub fn set_cookie_header(&self, value: &str, max_age: Duration) -> HeaderValue {
        HeaderValue::from_str(&self.build_set_cookie(value, max_age))
            .unwrap_or_else(|_| HeaderValue::from_static(""))
    }

    pub fn delete_cookie_header(&self) -> HeaderValue {
        HeaderValue::from_str(&self.build_delete_cookie())
            .unwrap_or_else(|_| HeaderValue::from_static(""))
    }
}

/// Extract a cookie value from the `Cookie` header
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key == name && !value.is_empty()).then(|| value.to_string())
        })
}
