//! Login Throttle
//! Mission: Lock accounts after repeated failed password checks

use crate::auth::models::Account;
use crate::auth::store::AccountRepository;
use anyhow::Result;
use std::sync::Arc;
use tracing::warn;

/// Failed attempts before an account locks.
pub const LOCKOUT_THRESHOLD: u32 = 5;

/// Counter-based lockout over the repository's persisted failure counter.
///
/// There is no time-based unlock: the counter clears only when a login
/// succeeds, and the lock check runs before credential verification, so a
/// locked account stays locked even when the correct password is supplied.
pub struct LoginThrottle {
    repo: Arc<dyn AccountRepository>,
    threshold: u32,
}

impl LoginThrottle {
    pub fn new(repo: Arc<dyn AccountRepository>) -> Self {
        Self {
            repo,
            threshold: LOCKOUT_THRESHOLD,
        }
    }

    pub fn is_locked(&self, account: &Account) -> bool {
        account.failed_logins >= self.threshold
    }

    /// Record a failed password check. Returns the new counter value.
    pub fn record_failure(&self, email: &str) -> Result<u32> {
        let count = self.repo.record_failure(email)?;
        if count >= self.threshold {
            warn!(email = %email, failures = count, "Account locked after repeated failures");
        }
        Ok(count)
    }

    pub fn reset(&self, email: &str) -> Result<()> {
        self.repo.reset_failures(email)
    }
}
