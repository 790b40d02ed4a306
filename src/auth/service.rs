//! Register, login, logout and identify.
//!
//! Holds no per-session state: everything a request needs to be recognised
//! again travels in the signed token. The only shared mutable state is the
//! credential store and, when enabled, the logout denylist.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::auth::cookie::{CookieDirective, SessionCookie};
use crate::auth::error::{AuthError, AuthResult};
use crate::auth::password::{PLACEHOLDER_HASH, hash_password_offloaded, verify_password_offloaded};
use crate::auth::revocation::RevocationList;
use crate::auth::token::{SessionClaims, SessionTokenCodec};
use crate::auth::user_store::CredentialStore;
use crate::config::AuthSettings;
use crate::model::{NewUser, PublicUser, Role, UserRecord};

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 6;

const MISSING_FIELD: &str = "missing field";
const INVALID_EMAIL: &str = "invalid email";
const PASSWORD_TOO_SHORT: &str = "password too short";
const MISSING_SESSION: &str = "missing session";
const INVALID_SESSION: &str = "invalid or expired session";

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

/// Registration payload. Fields are optional so absence is reported as a
/// validation error rather than a decoding failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl RegisterRequest {
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            email: Some(email.into()),
            password: Some(password.into()),
            name: Some(name.into()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl LoginRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            password: Some(password.into()),
        }
    }
}

/// Successful register or login.
#[derive(Debug, Clone)]
pub struct AuthOutcome {
    pub user: PublicUser,
    pub session_token: String,
    pub cookie: CookieDirective,
}

/// The caller behind a valid session.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user: PublicUser,
    pub claims: SessionClaims,
}

/// Lower-case and trim; applied before every lookup, check and insert.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn required(field: Option<String>) -> AuthResult<String> {
    field
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AuthError::validation(MISSING_FIELD))
}

pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    codec: SessionTokenCodec,
    cookie: SessionCookie,
    revocations: Option<RevocationList>,
}

impl AuthService {
    /// Build the service. Fails with `AuthError::Config` on unusable settings,
    /// which callers should treat as fatal at startup.
    pub fn new(store: Arc<dyn CredentialStore>, settings: &AuthSettings) -> AuthResult<Self> {
        settings.validate()?;

        Ok(Self {
            store,
            codec: SessionTokenCodec::from_settings(settings)?,
            cookie: SessionCookie::new(settings.environment, settings.session_ttl),
            revocations: settings.revoke_on_logout.then(RevocationList::new),
        })
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    pub fn revokes_on_logout(&self) -> bool {
        self.revocations.is_some()
    }

    pub async fn register(&self, request: RegisterRequest) -> AuthResult<AuthOutcome> {
        let email = required(request.email)?;
        let password = required(request.password)?;
        let name = required(request.name)?;

        let user = self.create_user(&email, password, name, Role::User).await?;
        info!(user_id = %user.id, email = %user.email, "User registered");

        self.start_session(&user)
    }

    pub async fn login(&self, request: LoginRequest) -> AuthResult<AuthOutcome> {
        let email = required(request.email.map(|email| normalize_email(&email)))?;
        let password = required(request.password)?;

        let Some(user) = self.store.find_by_email(&email).await? else {
            verify_password_offloaded(password, PLACEHOLDER_HASH.to_string()).await?;
            debug!("Login rejected: unknown account");
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password_offloaded(password, user.password_hash.clone()).await? {
            debug!(user_id = %user.id, "Login rejected: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        info!(user_id = %user.id, email = %user.email, "Login successful");
        self.start_session(&user)
    }

    /// Always succeeds. With revocation enabled, a still-valid token is
    /// deny-listed until its expiry; otherwise it keeps verifying until then.
    pub async fn logout(&self, token: Option<&str>) -> CookieDirective {
        if let (Some(revocations), Some(token)) = (&self.revocations, token) {
            match self.codec.verify(token) {
                Ok(claims) => {
                    info!(user_id = %claims.user_id, "Session revoked");
                    revocations.revoke(claims.jti, claims.exp).await;
                }
                Err(rejection) => debug!(%rejection, "Logout with unusable token"),
            }
        }

        info!("Logout");
        self.cookie.clear()
    }

    /// Verify a session token without touching the store.
    pub async fn authenticate(&self, token: Option<&str>) -> AuthResult<SessionClaims> {
        let token = token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::unauthorized(MISSING_SESSION))?;

        let claims = self.codec.verify(token).map_err(|rejection| {
            debug!(%rejection, "Session token rejected");
            AuthError::unauthorized(INVALID_SESSION)
        })?;

        if let Some(revocations) = &self.revocations {
            if revocations.is_revoked(&claims.jti).await {
                debug!(user_id = %claims.user_id, "Session token revoked");
                return Err(AuthError::unauthorized(INVALID_SESSION));
            }
        }

        Ok(claims)
    }

    /// Resolve the session to the current user record.
    pub async fn identify(&self, token: Option<&str>) -> AuthResult<Identity> {
        let claims = self.authenticate(token).await?;

        let user = self
            .store
            .find_by_id(&claims.user_id)
            .await?
            .ok_or_else(|| AuthError::NotFound("user not found".into()))?;

        Ok(Identity {
            user: user.sanitized(),
            claims,
        })
    }

    /// Create an administrator account (startup seeding).
    pub async fn seed_admin(
        &self,
        email: &str,
        password: String,
        name: String,
    ) -> AuthResult<PublicUser> {
        let user = self.create_user(email, password, name, Role::Admin).await?;
        info!(user_id = %user.id, email = %user.email, "Admin account seeded");
        Ok(user.sanitized())
    }

    async fn create_user(
        &self,
        email: &str,
        password: String,
        display_name: String,
        role: Role,
    ) -> AuthResult<UserRecord> {
        let email = normalize_email(email);
        if !EMAIL_PATTERN.is_match(&email) {
            return Err(AuthError::validation(INVALID_EMAIL));
        }
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::validation(PASSWORD_TOO_SHORT));
        }

        // Fast path; the insert below re-checks atomically.
        if self.store.find_by_email(&email).await?.is_some() {
            return Err(AuthError::Conflict("email already registered".into()));
        }

        let password_hash = hash_password_offloaded(password).await?;

        let user = self
            .store
            .insert(NewUser {
                email,
                password_hash,
                display_name,
                role,
            })
            .await?;

        Ok(user)
    }

    fn start_session(&self, user: &UserRecord) -> AuthResult<AuthOutcome> {
        let issued = self.codec.issue(user).inspect_err(|e| {
            warn!(error = %e, "Failed to issue session token");
        })?;

        Ok(AuthOutcome {
            user: user.sanitized(),
            cookie: self.cookie.set(issued.token.clone()),
            session_token: issued.token,
        })
    }
}
