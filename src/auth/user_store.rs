//! User storage.
//!
//! The auth core only talks to [`CredentialStore`]; [`MemoryUserStore`] is the
//! shipped backend and does not survive restarts.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::auth::error::AuthError;
use crate::model::{NewUser, UserRecord};
use crate::types::UserId;

/// Errors a store backend can report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A record with this email already exists.
    DuplicateEmail(String),
    /// The backend could not serve the request.
    Unavailable(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateEmail(email) => write!(f, "Email already registered: {}", email),
            Self::Unavailable(msg) => write!(f, "Store unavailable: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail(_) => AuthError::Conflict("email already registered".into()),
            StoreError::Unavailable(msg) => AuthError::Internal(msg),
        }
    }
}

/// Capability the auth core needs from user storage.
///
/// `insert` must check email uniqueness and write the record as one atomic
/// step; two concurrent inserts of the same email yield exactly one success.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserRecord>, StoreError>;

    async fn insert(&self, new_user: NewUser) -> Result<UserRecord, StoreError>;

    async fn count(&self) -> Result<usize, StoreError>;
}

#[derive(Default)]
struct Tables {
    by_id: HashMap<UserId, UserRecord>,
    // email -> id
    email_index: HashMap<String, UserId>,
}

/// In-memory store guarded by a single `RwLock`: concurrent reads,
/// serialized writes.
#[derive(Default)]
pub struct MemoryUserStore {
    tables: RwLock<Tables>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .email_index
            .get(email)
            .and_then(|id| tables.by_id.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.tables.read().await.by_id.get(id).cloned())
    }

    async fn insert(&self, new_user: NewUser) -> Result<UserRecord, StoreError> {
        let mut tables = self.tables.write().await;

        if tables.email_index.contains_key(&new_user.email) {
            return Err(StoreError::DuplicateEmail(new_user.email));
        }

        let record = UserRecord {
            id: UserId::generate(),
            email: new_user.email,
            password_hash: new_user.password_hash,
            display_name: new_user.display_name,
            role: new_user.role,
            created_at: Utc::now(),
        };

        tables
            .email_index
            .insert(record.email.clone(), record.id.clone());
        tables.by_id.insert(record.id.clone(), record.clone());

        Ok(record)
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.tables.read().await.by_id.len())
    }
}
