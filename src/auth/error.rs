//! Error taxonomy for authentication operations.
//!
//! Every variant maps to exactly one HTTP status. `Config` only ever occurs
//! while building the service at startup.

use std::fmt;

use http::StatusCode;

/// Message shared by both "unknown email" and "wrong password" so that a
/// failed login never reveals whether an account exists.
pub const INVALID_CREDENTIALS: &str = "invalid credentials";

/// Errors returned by the auth core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Client input is missing or malformed.
    Validation(String),
    /// The email address is already registered.
    Conflict(String),
    /// Unknown email or wrong password.
    InvalidCredentials,
    /// Missing, invalid, expired or revoked session.
    Unauthorized(String),
    /// The user referenced by a valid session no longer exists.
    NotFound(String),
    /// Startup configuration is unusable (e.g. empty signing secret).
    Config(String),
    /// Unexpected failure; details are logged, never returned.
    Internal(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(msg) => write!(f, "Validation error: {}", msg),
            Self::Conflict(msg) => write!(f, "Conflict: {}", msg),
            Self::InvalidCredentials => write!(f, "Authentication failed: {}", INVALID_CREDENTIALS),
            Self::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            Self::NotFound(msg) => write!(f, "Not found: {}", msg),
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AuthError {}

impl AuthError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// HTTP status the error surfaces as.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Conflict(_) => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials | Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Config(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message that is safe to send to the client.
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation(msg)
            | Self::Conflict(msg)
            | Self::Unauthorized(msg)
            | Self::NotFound(msg) => msg.clone(),
            Self::InvalidCredentials => INVALID_CREDENTIALS.to_string(),
            Self::Config(_) | Self::Internal(_) => "internal server error".to_string(),
        }
    }
}

impl From<tokio::task::JoinError> for AuthError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(format!("blocking task failed: {}", err))
    }
}

/// Result type for auth operations.
pub type AuthResult<T> = Result<T, AuthError>;
