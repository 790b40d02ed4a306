//! Session cookie contract.
//!
//! The core never touches HTTP responses directly: it returns a
//! [`CookieDirective`] and the HTTP layer renders it as a `Set-Cookie` header.

use std::time::Duration;

use http::HeaderMap;
use http::header::COOKIE;

use crate::config::Environment;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE_NAME: &str = "token";

const EPOCH_HTTP_DATE: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

/// Instruction for the HTTP layer about the session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieDirective {
    /// Store `value` under `name` for `max_age`.
    Set {
        name: String,
        value: String,
        max_age: Duration,
        secure: bool,
    },
    /// Remove the cookie from the client.
    Clear { name: String, secure: bool },
}

impl CookieDirective {
    pub fn name(&self) -> &str {
        match self {
            Self::Set { name, .. } | Self::Clear { name, .. } => name,
        }
    }

    /// Render as a `Set-Cookie` header value.
    pub fn to_header_value(&self) -> String {
        let (mut out, secure) = match self {
            Self::Set {
                name,
                value,
                max_age,
                secure,
            } => (
                format!("{}={}; Max-Age={}", name, value, max_age.as_secs()),
                *secure,
            ),
            Self::Clear { name, secure } => (
                format!("{}=; Max-Age=0; Expires={}", name, EPOCH_HTTP_DATE),
                *secure,
            ),
        };

        out.push_str("; Path=/; HttpOnly; SameSite=Lax");
        if secure {
            out.push_str("; Secure");
        }
        out
    }
}

/// Cookie attributes fixed for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct SessionCookie {
    secure: bool,
    max_age: Duration,
}

impl SessionCookie {
    pub fn new(environment: Environment, max_age: Duration) -> Self {
        Self {
            secure: environment.is_production(),
            max_age,
        }
    }

    pub fn set(&self, token: impl Into<String>) -> CookieDirective {
        CookieDirective::Set {
            name: SESSION_COOKIE_NAME.to_string(),
            value: token.into(),
            max_age: self.max_age,
            secure: self.secure,
        }
    }

    pub fn clear(&self) -> CookieDirective {
        CookieDirective::Clear {
            name: SESSION_COOKIE_NAME.to_string(),
            secure: self.secure,
        }
    }
}

/// Pull the session token out of the request's `Cookie` headers.
///
/// Empty values count as absent.
pub fn session_token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.split_once('='))
        .find(|(name, _)| name.trim() == SESSION_COOKIE_NAME)
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}
