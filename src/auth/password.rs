//! Password hashing using Argon2id.
//!
//! Hashes are PHC strings carrying their own salt and cost parameters.
//! Both operations are CPU-bound; the async variants move them onto the
//! blocking thread pool so request tasks are not stalled.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::auth::error::{AuthError, AuthResult};

/// Well-formed Argon2id hash at the default cost that no password matches.
/// Logins for unknown accounts verify against it, so both rejection paths
/// spend one full Argon2 verify.
pub const PLACEHOLDER_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Hash a plaintext password with a fresh random salt.
pub fn hash_password(plaintext: &str) -> AuthResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::internal(format!("password hashing failed: {}", e)))
}

/// Verify a plaintext password against a stored PHC hash.
///
/// Returns `Ok(false)` on mismatch and `Err` only if the stored hash is
/// malformed. The comparison itself is constant-time.
pub fn verify_password(plaintext: &str, hash: &str) -> AuthResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AuthError::internal(format!("invalid password hash: {}", e)))?;

    match Argon2::default().verify_password(plaintext.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::internal(format!("password verify failed: {}", e))),
    }
}

/// [`hash_password`] on the blocking pool.
pub async fn hash_password_offloaded(plaintext: String) -> AuthResult<String> {
    tokio::task::spawn_blocking(move || hash_password(&plaintext)).await?
}

/// [`verify_password`] on the blocking pool.
pub async fn verify_password_offloaded(plaintext: String, hash: String) -> AuthResult<bool> {
    tokio::task::spawn_blocking(move || verify_password(&plaintext, &hash)).await?
}
