//! The `access_token` session cookie.

use axum::http::{header::COOKIE, HeaderMap};

pub const ACCESS_TOKEN: &str = "access_token";

/// Attributes shared by the cookie we set and the one we clear.
#[derive(Debug, Clone, Copy)]
pub struct CookieSettings {
    /// Adds `Secure`; on in production.
    pub secure: bool,
    pub max_age_secs: i64,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            secure: false,
            max_age_secs: 24 * 60 * 60,
        }
    }
}

impl CookieSettings {
    pub fn session(&self, token: &str) -> String {
        self.build(token, self.max_age_secs)
    }

    pub fn cleared(&self) -> String {
        self.build("", 0)
    }

    fn build(&self, value: &str, max_age: i64) -> String {
        let mut cookie =
            format!("{ACCESS_TOKEN}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}");
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

/// Finds the access token among the request's `Cookie` headers.
pub fn read_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == ACCESS_TOKEN && !value.is_empty())
        .map(|(_, value)| value.to_string())
}
