//! `Cookie` / `Set-Cookie` header helpers for the session cookies.

use axum::http::{header::COOKIE, HeaderMap};
use std::collections::HashMap;

/// Seven days, the lifetime of every session cookie write.
pub const DEFAULT_MAX_AGE_SECONDS: i64 = 60 * 60 * 24 * 7;

/// Attributes applied to every session cookie.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CookieOptions {
    pub secure: bool,
    pub max_age_seconds: i64,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            secure: false,
            max_age_seconds: DEFAULT_MAX_AGE_SECONDS,
        }
    }
}

impl CookieOptions {
    #[must_use]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    #[must_use]
    pub fn with_max_age_seconds(mut self, max_age_seconds: i64) -> Self {
        self.max_age_seconds = max_age_seconds;
        self
    }
}

/// Builds a `Set-Cookie` value. The value is percent-encoded.
#[must_use]
pub fn set_cookie(name: &str, value: &str, options: CookieOptions) -> String {
    let value = urlencoding::encode(value);
    let mut cookie = format!(
        "{name}={value}; Path=/; SameSite=Lax; Max-Age={}",
        options.max_age_seconds
    );
    if options.secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Builds a `Set-Cookie` value that expires the cookie immediately.
#[must_use]
pub fn expire_cookie(name: &str, options: CookieOptions) -> String {
    let mut cookie = format!("{name}=; Path=/; SameSite=Lax; Max-Age=0");
    if options.secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Collects every cookie sent with a request, decoding percent-encoded values.
/// When a name repeats, the first occurrence wins.
#[must_use]
pub fn parse_cookie_headers(headers: &HeaderMap) -> HashMap<String, String> {
    let mut cookies = HashMap::new();
    for header in headers.get_all(COOKIE) {
        let Ok(value) = header.to_str() else {
            continue;
        };
        for (name, value) in parse_pairs(value) {
            cookies.entry(name).or_insert(value);
        }
    }
    cookies
}

fn parse_pairs(header: &str) -> impl Iterator<Item = (String, String)> + '_ {
    header.split(';').filter_map(|pair| {
        let mut parts = pair.trim().splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim().trim_matches('"');
        if key.is_empty() {
            return None;
        }
        let decoded = urlencoding::decode(val).map_or_else(|_| val.to_string(), |v| v.into_owned());
        Some((key.to_string(), decoded))
    })
}
