//! Session token issuance and verification (HS256 JWT).
//!
//! Tokens are self-contained: validity depends only on the signature and the
//! `exp` claim. Nothing is stored server side unless the service layers a
//! [`crate::auth::RevocationList`] on top.

use std::fmt;
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::auth::error::{AuthError, AuthResult};
use crate::config::{AuthSettings, check_session_ttl};
use crate::model::{Role, UserRecord};
use crate::types::{TokenId, UserId};

/// Identity facts embedded in every session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    pub user_id: UserId,
    pub email: String,
    pub role: Role,
    /// Issued at (Unix seconds).
    pub iat: i64,
    /// Expiry (Unix seconds). The token is rejected once `now >= exp`.
    pub exp: i64,
    /// Token id, the revocation handle.
    pub jti: TokenId,
}

/// Why a token failed verification.
///
/// Only used for logging; callers collapse every variant into the same
/// unauthorized response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenRejection {
    /// Bad signature, wrong algorithm, or not a JWT at all.
    Malformed(String),
    /// Well-formed and correctly signed, but past `exp`.
    Expired,
}

impl fmt::Display for TokenRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(msg) => write!(f, "malformed token: {}", msg),
            Self::Expired => write!(f, "token expired"),
        }
    }
}

impl std::error::Error for TokenRejection {}

/// A freshly signed token together with the claims it carries.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: SessionClaims,
}

/// Signs and verifies session tokens with a process-wide secret.
#[derive(Clone)]
pub struct SessionTokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl SessionTokenCodec {
    /// Build a codec. An empty secret is a configuration error.
    pub fn new(secret: &str, ttl: Duration) -> AuthResult<Self> {
        if secret.trim().is_empty() {
            return Err(AuthError::Config("JWT secret is missing or empty".into()));
        }
        check_session_ttl(ttl)?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        })
    }

    pub fn from_settings(settings: &AuthSettings) -> AuthResult<Self> {
        Self::new(&settings.jwt_secret, settings.session_ttl)
    }

    /// Issue a token for `user` valid for the configured ttl.
    pub fn issue(&self, user: &UserRecord) -> AuthResult<IssuedToken> {
        let iat = Utc::now().timestamp();
        let exp = i64::try_from(self.ttl.as_secs())
            .ok()
            .and_then(|ttl_secs| iat.checked_add(ttl_secs))
            .ok_or_else(|| AuthError::internal("session expiry out of range"))?;

        let claims = SessionClaims {
            user_id: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
            iat,
            exp,
            jti: TokenId::generate(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::internal(format!("token signing failed: {}", e)))?;

        Ok(IssuedToken { token, claims })
    }

    /// Check signature and expiry and return the embedded claims.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenRejection> {
        let claims = decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenRejection::Expired,
                _ => TokenRejection::Malformed(e.to_string()),
            })?;

        // jsonwebtoken accepts `exp == now`; a session ends at its expiry second.
        if claims.exp <= Utc::now().timestamp() {
            return Err(TokenRejection::Expired);
        }

        Ok(claims)
    }
}
