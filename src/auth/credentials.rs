//! Credential Verification
//! Mission: One-way password hashing and verification

use anyhow::{Context, Result};
use bcrypt::{hash, verify, DEFAULT_COST};

/// Hash a plaintext password with bcrypt.
///
/// The output is self-identifying (`$2b$<cost>$<salt><digest>`), so the
/// algorithm and cost can be migrated later without a schema change.
pub fn hash_password(plaintext: &str) -> Result<String> {
    hash(plaintext, DEFAULT_COST).context("Failed to hash password")
}

/// Check a plaintext password against a stored digest.
///
/// A malformed stored digest is treated as a non-match, never an error;
/// callers only ever see match / no-match.
pub fn verify_password(plaintext: &str, stored: &str) -> bool {
    verify(plaintext, stored).unwrap_or(false)
}
