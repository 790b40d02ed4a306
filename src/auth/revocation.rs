//! Logout denylist keyed by token id.
//!
//! An entry lives exactly as long as the token it revokes could otherwise
//! verify; expired entries are pruned on every write.

use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::types::TokenId;

#[derive(Default)]
pub struct RevocationList {
    /// jti -> token `exp` (Unix seconds)
    entries: RwLock<HashMap<TokenId, i64>>,
}

impl RevocationList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deny `jti` until `expires_at`.
    pub async fn revoke(&self, jti: TokenId, expires_at: i64) {
        let now = Utc::now().timestamp();
        let mut entries = self.entries.write().await;

        let before = entries.len();
        entries.retain(|_, exp| *exp > now);
        if entries.len() != before {
            debug!("Pruned {} expired revocations", before - entries.len());
        }

        if expires_at > now {
            entries.insert(jti, expires_at);
        }
    }

    pub async fn is_revoked(&self, jti: &TokenId) -> bool {
        self.entries.read().await.contains_key(jti)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
