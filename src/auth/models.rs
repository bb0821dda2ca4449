//! Authentication Models
//! Mission: Define the account, role, and token claim structures

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Marketplace account record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // bcrypt hash - never serialize
    pub role: AccountRole,
    /// Consecutive failed login attempts. Reset on success.
    pub failed_logins: u32,
    pub nickname: String,
    pub address: String,
    pub avatar_path: Option<String>,
    pub created_at: String,
}

impl Account {
    pub fn new(email: &str, password_hash: String, role: AccountRole, profile: Profile) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash,
            role,
            failed_logins: 0,
            nickname: profile.nickname,
            address: profile.address,
            avatar_path: profile.avatar_path,
            created_at: Utc::now().to_rfc3339(),
        }
    }
}

/// Account roles. `Deleted` is terminal: a soft-deleted account can never
/// authenticate again, though its record stays queryable by email.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AccountRole {
    #[serde(rename = "USER")]
    User, // Buyer account
    #[serde(rename = "SELLER")]
    Seller, // Can list products
    #[serde(rename = "DELETED")]
    Deleted, // Soft-deleted, terminal
}

impl AccountRole {
    pub fn as_str(&self) -> &str {
        match self {
            AccountRole::User => "USER",
            AccountRole::Seller => "SELLER",
            AccountRole::Deleted => "DELETED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "USER" => Some(AccountRole::User),
            "SELLER" => Some(AccountRole::Seller),
            "DELETED" => Some(AccountRole::Deleted),
            _ => None,
        }
    }

    /// Roles a client may request at signup. `Deleted` is never assignable.
    pub fn signup_role(s: &str) -> Option<Self> {
        match Self::from_str(s) {
            Some(AccountRole::Deleted) | None => None,
            role => role,
        }
    }
}

/// Profile attributes carried alongside the auth fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    pub nickname: String,
    pub address: String,
    pub avatar_path: Option<String>,
}

/// JWT claims payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // subject (account email)
    pub id: Uuid,
    pub role: AccountRole,
    pub iat: i64,
    pub exp: i64,
}

/// Signup request body.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    /// "USER" or "SELLER"; anything else is rejected.
    pub role: String,
    #[serde(flatten)]
    pub profile: Profile,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Account-deletion request body. Both fields must re-confirm the
/// credentials of the account the presented token belongs to.
#[derive(Debug, Deserialize)]
pub struct DeleteAccountRequest {
    pub email: String,
    pub password: String,
}

/// Public account view (sanitized).
#[derive(Debug, Clone, Serialize)]
pub struct AccountResponse {
    pub id: Uuid,
    pub email: String,
    pub role: AccountRole,
    pub nickname: String,
    pub address: String,
    pub avatar_path: Option<String>,
    pub created_at: String,
}

impl AccountResponse {
    pub fn from_account(account: &Account) -> Self {
        Self {
            id: account.id,
            email: account.email.clone(),
            role: account.role,
            nickname: account.nickname.clone(),
            address: account.address.clone(),
            avatar_path: account.avatar_path.clone(),
            created_at: account.created_at.clone(),
        }
    }
}
