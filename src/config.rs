//! Process-wide authentication settings.
//!
//! Loaded once at startup and handed to [`crate::auth::AuthService::new`];
//! nothing reads the environment at request time.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::auth::AuthError;

/// Default session lifetime (24 hours).
pub const DEFAULT_SESSION_TTL_SECONDS: u64 = 24 * 60 * 60;

/// Longest accepted session lifetime (400 days). Browsers cap cookie
/// lifetimes at this value.
pub const MAX_SESSION_TTL_SECONDS: u64 = 400 * 24 * 60 * 60;

/// Session lifetimes must be whole seconds in `1..=MAX_SESSION_TTL_SECONDS`
/// so the cookie `Max-Age` and the token `exp` agree.
pub fn check_session_ttl(ttl: Duration) -> Result<(), AuthError> {
    if ttl.subsec_nanos() != 0 || ttl.is_zero() {
        return Err(AuthError::Config(
            "session ttl must be a positive whole number of seconds".into(),
        ));
    }
    if ttl.as_secs() > MAX_SESSION_TTL_SECONDS {
        return Err(AuthError::Config(format!(
            "session ttl must not exceed {} seconds",
            MAX_SESSION_TTL_SECONDS
        )));
    }
    Ok(())
}

/// Deployment environment. Only `Production` marks cookies `Secure`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "development" | "dev" | "test" => Ok(Self::Development),
            other => Err(format!("unknown environment `{}`", other)),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authentication settings.
#[derive(Clone)]
pub struct AuthSettings {
    /// HMAC secret used to sign session tokens.
    pub jwt_secret: String,
    /// Deployment environment (controls the cookie `Secure` flag).
    pub environment: Environment,
    /// Session token and cookie lifetime.
    pub session_ttl: Duration,
    /// Deny-list a token's id on logout so it stops verifying before expiry.
    pub revoke_on_logout: bool,
}

impl AuthSettings {
    /// Create settings with defaults: development, 24h sessions, stateless logout.
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            environment: Environment::default(),
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECONDS),
            revoke_on_logout: false,
        }
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    pub fn with_revoke_on_logout(mut self, enabled: bool) -> Self {
        self.revoke_on_logout = enabled;
        self
    }

    /// Reject settings the service cannot run with.
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(AuthError::Config("JWT secret is missing or empty".into()));
        }
        check_session_ttl(self.session_ttl)
    }
}

// The secret must never end up in logs via `{:?}`.
impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("jwt_secret", &"<redacted>")
            .field("environment", &self.environment)
            .field("session_ttl", &self.session_ttl)
            .field("revoke_on_logout", &self.revoke_on_logout)
            .finish()
    }
}
