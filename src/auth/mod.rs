//! Authentication core.
//!
//! Credential verification, signed-session issuance and the cookie transport
//! contract. The HTTP layer in [`crate::api`] only decodes requests, calls
//! into [`AuthService`] and renders the results.
//!
//! ## Security Model
//!
//! - Passwords are hashed with Argon2id on the blocking pool
//! - Sessions are stateless HS256 tokens delivered in an `HttpOnly` cookie
//! - Failed logins never reveal whether the email exists
//! - Logout clears the cookie; with `revoke_on_logout` the token id is also
//!   deny-listed until it expires
//!
//! ## Usage
//!
//! ```ignore
//! let auth = AuthService::new(Arc::new(MemoryUserStore::new()), &settings)?;
//! let outcome = auth.register(RegisterRequest::new("a@b.com", "secret1", "Ann")).await?;
//! let identity = auth.identify(Some(&outcome.session_token)).await?;
//! ```

mod cookie;
mod error;
pub mod password;
mod revocation;
mod service;
mod token;
mod user_store;

pub use cookie::{CookieDirective, SESSION_COOKIE_NAME, SessionCookie, session_token_from_headers};
pub use error::{AuthError, AuthResult, INVALID_CREDENTIALS};
pub use revocation::RevocationList;
pub use service::{
    AuthOutcome, AuthService, Identity, LoginRequest, MIN_PASSWORD_LENGTH, RegisterRequest,
    normalize_email,
};
pub use token::{IssuedToken, SessionClaims, SessionTokenCodec, TokenRejection};
pub use user_store::{CredentialStore, MemoryUserStore, StoreError};
