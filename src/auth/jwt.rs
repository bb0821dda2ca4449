//! JWT Token Codec
//! Mission: Issue and verify the signed tokens that carry a session identity

use crate::auth::models::{Account, Claims};
use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::debug;

/// Default token validity: 7 days.
pub const TOKEN_VALIDITY_SECS: i64 = 7 * 24 * 60 * 60;

/// Codec for issuing and decoding HMAC-SHA256 signed tokens.
///
/// The signing secret is process-wide configuration, loaded once at startup.
/// Key rotation is out of scope.
pub struct TokenCodec {
    secret: String,
    validity: Duration,
}

impl TokenCodec {
    pub fn new(secret: String) -> Self {
        Self {
            secret,
            validity: Duration::seconds(TOKEN_VALIDITY_SECS),
        }
    }

    /// Override the validity window. Tests use this to mint
    /// already-expired tokens.
    pub fn with_validity(mut self, validity: Duration) -> Self {
        self.validity = validity;
        self
    }

    /// Issue a compact signed token for the account's current role.
    pub fn issue(&self, account: &Account) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: account.email.clone(),
            id: account.id,
            role: account.role,
            iat: now.timestamp(),
            exp: (now + self.validity).timestamp(),
        };

        debug!(email = %account.email, role = account.role.as_str(), "Issuing token");

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .context("Failed to sign token")
    }

    /// Verify signature and structure, returning the claims.
    ///
    /// Expiry is deliberately not enforced here: the authorization filter
    /// checks it separately so an expired token is reported distinctly from
    /// a forged or malformed one.
    pub fn decode(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;

        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .context("Invalid token")?;

        Ok(decoded.claims)
    }

    /// True iff the expiry claim is strictly before the current time.
    pub fn is_expired(&self, claims: &Claims) -> bool {
        claims.exp < Utc::now().timestamp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::{AccountRole, Profile};

    fn test_account(role: AccountRole) -> Account {
        Account::new(
            "buyer@example.com",
            "hash".to_string(),
            role,
            Profile::default(),
        )
    }

    #[test]
    fn test_issue_and_decode_round_trip() {
        let codec = TokenCodec::new("test-secret-key-12345".to_string());
        let account = test_account(AccountRole::Seller);

        let token = codec.issue(&account).unwrap();
        assert!(!token.is_empty());

        let claims = codec.decode(&token).unwrap();
        assert_eq!(claims.sub, account.email);
        assert_eq!(claims.id, account.id);
        assert_eq!(claims.role, AccountRole::Seller);
        assert_eq!(claims.exp, claims.iat + TOKEN_VALIDITY_SECS);
        assert!(!codec.is_expired(&claims));
    }

    #[test]
    fn test_malformed_token_rejected() {
        let codec = TokenCodec::new("test-secret-key-12345".to_string());
        assert!(codec.decode("not.a.token").is_err());
        assert!(codec.decode("").is_err());
    }

    #[test]
    fn test_different_secrets_reject() {
        let codec1 = TokenCodec::new("secret1".to_string());
        let codec2 = TokenCodec::new("secret2".to_string());
        let account = test_account(AccountRole::User);

        let token = codec1.issue(&account).unwrap();
        assert!(codec2.decode(&token).is_err());
    }

    #[test]
    fn test_expired_token_still_decodes() {
        // Expiry is the filter's concern; decode only checks the signature.
        let codec = TokenCodec::new("test-secret-key-12345".to_string())
            .with_validity(Duration::seconds(-60));
        let account = test_account(AccountRole::User);

        let token = codec.issue(&account).unwrap();
        let claims = codec.decode(&token).unwrap();
        assert!(codec.is_expired(&claims));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let codec = TokenCodec::new("test-secret-key-12345".to_string());
        let account = test_account(AccountRole::User);
        let token = codec.issue(&account).unwrap();

        // Flip a character in the payload segment
        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        let mut payload: Vec<u8> = parts[1].clone().into_bytes();
        payload[0] = if payload[0] == b'A' { b'B' } else { b'A' };
        parts[1] = String::from_utf8(payload).unwrap();

        assert!(codec.decode(&parts.join(".")).is_err());
    }
}
