// Core modules
pub mod api;
pub mod auth;
pub mod config;
pub mod model;
pub mod types;

// Re-export key types and functions
pub use auth::{
    AuthError, AuthOutcome, AuthResult, AuthService, CookieDirective, CredentialStore, Identity,
    LoginRequest, MemoryUserStore, RegisterRequest, SessionClaims,
};
pub use config::{AuthSettings, Environment};
pub use model::{PublicUser, Role};
pub use types::{TokenId, UserId};

use std::sync::Arc;

/// Convenience function to create a fully wired HTTP application.
///
/// Builds an [`AuthService`] over a fresh in-memory store and mounts it on the
/// API router. Fails when the settings are unusable (for example an empty
/// signing secret).
pub fn create_app(settings: &AuthSettings) -> AuthResult<(Arc<AuthService>, axum::Router)> {
    let store: Arc<dyn CredentialStore> = Arc::new(MemoryUserStore::new());
    let service = Arc::new(AuthService::new(store, settings)?);
    let router = api::create_router(service.clone());
    Ok((service, router))
}
