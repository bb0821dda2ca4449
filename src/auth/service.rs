//! Authentication Service
//! Mission: Orchestrate signup, login, logout, and account deletion

use crate::auth::credentials::{hash_password, verify_password};
use crate::auth::jwt::TokenCodec;
use crate::auth::models::{Account, AccountResponse, AccountRole, Claims, Profile};
use crate::auth::revocation::RevocationStore;
use crate::auth::store::AccountRepository;
use crate::auth::throttle::LoginThrottle;
use std::sync::Arc;
use tracing::{info, warn};

/// Authentication errors. All terminal for the current request.
///
/// `Storage` wraps repository failures unchanged so callers can treat them
/// as a distinct storage-unavailable class.
#[derive(Debug)]
pub enum AuthError {
    DuplicateAccount,
    InvalidRole,
    AccountNotFound,
    AccountLocked,
    InvalidCredentials,
    AccountDeleted,
    InvalidToken,
    Storage(anyhow::Error),
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::DuplicateAccount => write!(f, "An account with this email already exists"),
            AuthError::InvalidRole => write!(f, "Unknown account role"),
            AuthError::AccountNotFound => write!(f, "No account matches this email"),
            AuthError::AccountLocked => {
                write!(f, "Account locked after too many failed login attempts")
            }
            AuthError::InvalidCredentials => write!(f, "Invalid email or password"),
            AuthError::AccountDeleted => write!(f, "This account has been deleted"),
            AuthError::InvalidToken => write!(f, "Invalid token"),
            AuthError::Storage(e) => write!(f, "Storage error: {}", e),
        }
    }
}

impl std::error::Error for AuthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AuthError::Storage(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(e: anyhow::Error) -> Self {
        AuthError::Storage(e)
    }
}

/// Successful login result.
#[derive(Debug)]
pub struct LoginOutcome {
    pub token: String,
    pub account: AccountResponse,
}

/// Orchestrates the account lifecycle over the injected repository,
/// token codec, revocation set, and login throttle.
pub struct AuthService {
    repo: Arc<dyn AccountRepository>,
    codec: Arc<TokenCodec>,
    revocations: RevocationStore,
    throttle: LoginThrottle,
}

impl AuthService {
    pub fn new(
        repo: Arc<dyn AccountRepository>,
        codec: Arc<TokenCodec>,
        revocations: RevocationStore,
    ) -> Self {
        let throttle = LoginThrottle::new(repo.clone());
        Self {
            repo,
            codec,
            revocations,
            throttle,
        }
    }

    /// Create an account. The email of a soft-deleted account is free to be
    /// claimed again; the fresh record replaces the deleted one.
    pub fn signup(
        &self,
        email: &str,
        password: &str,
        role: &str,
        profile: Profile,
    ) -> Result<AccountResponse, AuthError> {
        let role = AccountRole::signup_role(role).ok_or(AuthError::InvalidRole)?;

        if let Some(existing) = self.repo.find_by_email(email)? {
            if existing.role != AccountRole::Deleted {
                return Err(AuthError::DuplicateAccount);
            }
        }

        let hash = hash_password(password)?;
        let account = Account::new(email, hash, role, profile);
        self.repo.save(&account)?;

        info!(email = %email, role = role.as_str(), "Account created");
        Ok(AccountResponse::from_account(&account))
    }

    /// Verify credentials and issue a token bound to the account's current
    /// role.
    ///
    /// The lock check runs before password verification, so a locked account
    /// rejects even the correct password. A deleted account that somehow
    /// passes verification gets its fresh token revoked on the spot.
    pub fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let account = self
            .repo
            .find_by_email(email)?
            .ok_or(AuthError::AccountNotFound)?;

        if self.throttle.is_locked(&account) {
            warn!(email = %email, "Login attempt against locked account");
            return Err(AuthError::AccountLocked);
        }

        if !verify_password(password, &account.password_hash) {
            self.throttle.record_failure(email)?;
            return Err(AuthError::InvalidCredentials);
        }

        self.throttle.reset(email)?;

        let token = self.codec.issue(&account)?;

        if account.role == AccountRole::Deleted {
            // Defensive: a deleted account must never hold a live token.
            if let Ok(claims) = self.codec.decode(&token) {
                self.revocations.revoke(&token, claims.exp);
            }
            return Err(AuthError::AccountDeleted);
        }

        info!(email = %email, role = account.role.as_str(), "Login successful");
        Ok(LoginOutcome {
            token,
            account: AccountResponse::from_account(&account),
        })
    }

    /// Revoke the presented token. Safe to call twice; the second call
    /// re-revokes harmlessly. Decode failures of any kind surface as a
    /// plain `InvalidToken` so clients never observe internal detail.
    pub fn logout(&self, token: &str) -> Result<(), AuthError> {
        let claims = self
            .codec
            .decode(token)
            .map_err(|_| AuthError::InvalidToken)?;

        if self.repo.find_by_email(&claims.sub)?.is_none() {
            return Err(AuthError::AccountNotFound);
        }

        self.revocations.revoke(token, claims.exp);
        info!(email = %claims.sub, "Logged out");
        Ok(())
    }

    /// Soft-delete the token holder's account.
    ///
    /// The confirmation email must match the token subject exactly and the
    /// password must verify; otherwise nothing changes. On success the
    /// presenting token is revoked as well. Tokens issued earlier for this
    /// account stay valid until they expire.
    pub fn delete_account(
        &self,
        token: &str,
        confirm_email: &str,
        confirm_password: &str,
    ) -> Result<(), AuthError> {
        let claims = self
            .codec
            .decode(token)
            .map_err(|_| AuthError::InvalidToken)?;

        let mut account = self
            .repo
            .find_by_email(&claims.sub)?
            .ok_or(AuthError::AccountNotFound)?;

        if claims.sub != confirm_email
            || !verify_password(confirm_password, &account.password_hash)
        {
            return Err(AuthError::InvalidCredentials);
        }

        account.role = AccountRole::Deleted;
        self.repo.save(&account)?;
        self.revocations.revoke(token, claims.exp);

        info!(email = %account.email, "Account soft-deleted");
        Ok(())
    }

    /// Resolve the live account behind a token.
    ///
    /// Returns current state, not the role baked into the token; callers
    /// must not assume the two agree.
    pub fn resolve_identity(&self, token: &str) -> Result<Account, AuthError> {
        let claims = self
            .codec
            .decode(token)
            .map_err(|_| AuthError::InvalidToken)?;

        self.repo
            .find_by_email(&claims.sub)?
            .ok_or(AuthError::AccountNotFound)
    }

    pub fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        self.codec.decode(token).map_err(|_| AuthError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::store::MemoryAccountStore;
    use crate::auth::throttle::LOCKOUT_THRESHOLD;

    fn service() -> AuthService {
        AuthService::new(
            Arc::new(MemoryAccountStore::new()),
            Arc::new(TokenCodec::new("test-secret-key-12345".to_string())),
            RevocationStore::new(),
        )
    }

    fn profile() -> Profile {
        Profile {
            nickname: "nick".to_string(),
            address: "1 Market Sq".to_string(),
            avatar_path: None,
        }
    }

    #[test]
    fn test_signup_then_duplicate() {
        let svc = service();

        let created = svc.signup("a@x.com", "p1", "USER", profile()).unwrap();
        assert_eq!(created.role, AccountRole::User);

        let err = svc.signup("a@x.com", "p2", "SELLER", profile()).unwrap_err();
        assert!(matches!(err, AuthError::DuplicateAccount));
    }

    #[test]
    fn test_signup_invalid_role() {
        let svc = service();
        assert!(matches!(
            svc.signup("a@x.com", "p", "ADMIN", profile()).unwrap_err(),
            AuthError::InvalidRole
        ));
        assert!(matches!(
            svc.signup("a@x.com", "p", "DELETED", profile()).unwrap_err(),
            AuthError::InvalidRole
        ));
    }

    #[test]
    fn test_login_success_and_wrong_password() {
        let svc = service();
        svc.signup("a@x.com", "p1", "USER", profile()).unwrap();

        assert!(matches!(
            svc.login("a@x.com", "wrong").unwrap_err(),
            AuthError::InvalidCredentials
        ));
        assert!(matches!(
            svc.login("ghost@x.com", "p1").unwrap_err(),
            AuthError::AccountNotFound
        ));

        let outcome = svc.login("a@x.com", "p1").unwrap();
        assert!(!outcome.token.is_empty());
        assert_eq!(outcome.account.email, "a@x.com");
    }

    #[test]
    fn test_lockout_rejects_correct_password() {
        let svc = service();
        svc.signup("a@x.com", "p1", "USER", profile()).unwrap();

        for _ in 0..LOCKOUT_THRESHOLD {
            assert!(matches!(
                svc.login("a@x.com", "wrong").unwrap_err(),
                AuthError::InvalidCredentials
            ));
        }

        // Counter-based lockout: the correct password no longer helps.
        assert!(matches!(
            svc.login("a@x.com", "p1").unwrap_err(),
            AuthError::AccountLocked
        ));
    }

    #[test]
    fn test_failure_counter_resets_on_success() {
        let svc = service();
        svc.signup("a@x.com", "p1", "USER", profile()).unwrap();

        for _ in 0..LOCKOUT_THRESHOLD - 1 {
            let _ = svc.login("a@x.com", "wrong");
        }
        svc.login("a@x.com", "p1").unwrap();

        // Back to a clean slate
        for _ in 0..LOCKOUT_THRESHOLD - 1 {
            let _ = svc.login("a@x.com", "wrong");
        }
        assert!(svc.login("a@x.com", "p1").is_ok());
    }

    #[test]
    fn test_logout_revokes_and_is_idempotent() {
        let svc = service();
        svc.signup("a@x.com", "p1", "USER", profile()).unwrap();
        let outcome = svc.login("a@x.com", "p1").unwrap();

        svc.logout(&outcome.token).unwrap();
        // Second revocation is harmless
        svc.logout(&outcome.token).unwrap();

        assert!(matches!(
            svc.logout("garbage-token").unwrap_err(),
            AuthError::InvalidToken
        ));
    }

    #[test]
    fn test_delete_account_requires_confirmation() {
        let svc = service();
        svc.signup("a@x.com", "p1", "USER", profile()).unwrap();
        let outcome = svc.login("a@x.com", "p1").unwrap();

        // Wrong confirmation password: nothing changes
        assert!(matches!(
            svc.delete_account(&outcome.token, "a@x.com", "nope").unwrap_err(),
            AuthError::InvalidCredentials
        ));
        // Wrong confirmation email: nothing changes
        assert!(matches!(
            svc.delete_account(&outcome.token, "b@x.com", "p1").unwrap_err(),
            AuthError::InvalidCredentials
        ));
        assert!(svc.login("a@x.com", "p1").is_ok());

        svc.delete_account(&outcome.token, "a@x.com", "p1").unwrap();
        let account = svc.resolve_identity(&outcome.token).unwrap();
        assert_eq!(account.role, AccountRole::Deleted);
    }

    #[test]
    fn test_deleted_account_cannot_login() {
        let svc = service();
        svc.signup("a@x.com", "p1", "USER", profile()).unwrap();
        let outcome = svc.login("a@x.com", "p1").unwrap();
        svc.delete_account(&outcome.token, "a@x.com", "p1").unwrap();

        assert!(matches!(
            svc.login("a@x.com", "p1").unwrap_err(),
            AuthError::AccountDeleted
        ));
    }

    #[test]
    fn test_deleted_email_can_sign_up_again() {
        let svc = service();
        svc.signup("a@x.com", "p1", "USER", profile()).unwrap();
        let outcome = svc.login("a@x.com", "p1").unwrap();
        svc.delete_account(&outcome.token, "a@x.com", "p1").unwrap();

        let recreated = svc.signup("a@x.com", "p2", "SELLER", profile()).unwrap();
        assert_eq!(recreated.role, AccountRole::Seller);
        assert!(svc.login("a@x.com", "p2").is_ok());
    }

    #[test]
    fn test_resolve_identity_returns_live_state() {
        let svc = service();
        svc.signup("a@x.com", "p1", "SELLER", profile()).unwrap();
        let outcome = svc.login("a@x.com", "p1").unwrap();
        svc.delete_account(&outcome.token, "a@x.com", "p1").unwrap();

        // Token still says SELLER; the live account says DELETED.
        let claims = svc.decode(&outcome.token).unwrap();
        assert_eq!(claims.role, AccountRole::Seller);
        let live = svc.resolve_identity(&outcome.token).unwrap();
        assert_eq!(live.role, AccountRole::Deleted);
    }
}
