//! Token Revocation Store
//! Mission: Keep revoked-but-unexpired tokens from authenticating

use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Process-wide set of revoked tokens, shared across request handlers.
///
/// Each entry carries the token's expiry timestamp so the set can be purged
/// once a revoked token would have died naturally. Not persisted: after a
/// restart a revoked token authenticates again until it expires. A shared
/// external backend would be needed for multi-node deployments.
#[derive(Clone, Default)]
pub struct RevocationStore {
    revoked: Arc<Mutex<HashMap<String, i64>>>,
}

impl RevocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a token as revoked until `exp` (unix seconds). Revoking an
    /// already-revoked token is harmless.
    pub fn revoke(&self, token: &str, exp: i64) {
        let mut revoked = self.revoked.lock();
        let now = Utc::now().timestamp();
        revoked.retain(|_, e| *e >= now);
        revoked.insert(token.to_string(), exp);
        debug!(entries = revoked.len(), "Token revoked");
    }

    pub fn is_revoked(&self, token: &str) -> bool {
        self.revoked.lock().contains_key(token)
    }

    /// Drop entries whose token has expired on its own.
    pub fn purge_expired(&self) {
        let now = Utc::now().timestamp();
        self.revoked.lock().retain(|_, exp| *exp >= now);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.revoked.lock().len()
    }
}
