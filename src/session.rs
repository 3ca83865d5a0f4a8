use axum::http::{HeaderMap, header::COOKIE};
use axum_extra::extract::cookie::Cookie;
use std::fmt;

/// Name of the cookie the external sign-in flow stores the bearer token in.
pub const TOKEN_COOKIE: &str = "token";

/// Caller identity for requests against the grants API.
///
/// Built from the incoming request's cookies and handed explicitly to every
/// authenticated call. An anonymous session carries an empty token.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: String,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    /// First `token` cookie across all `Cookie` headers, or an empty token.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get_all(COOKIE)
            .iter()
            .find_map(|value| token_in(&String::from_utf8_lossy(value.as_bytes())))
            .map(Self::new)
            .unwrap_or_default()
    }

    /// Reads the token out of a raw `Cookie` header value such as
    /// `"token=abc123; other=x"`.
    pub fn from_cookie_header(raw: &str) -> Self {
        token_in(raw).map(Self::new).unwrap_or_default()
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn is_anonymous(&self) -> bool {
        self.token.is_empty()
    }
}

// Values are taken as sent; the token is not percent-decoded.
fn token_in(raw: &str) -> Option<String> {
    Cookie::split_parse(raw)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = if self.is_anonymous() { "<none>" } else { "<redacted>" };
        f.debug_struct("Session").field("token", &token).finish()
    }
}
