//! Password hashing via bcrypt and temporary secret generation.

use std::sync::LazyLock;

use rand::distr::Alphanumeric;
use rand::{Rng, rng};

use super::AuthError;

/// bcrypt cost factor.
const BCRYPT_COST: u32 = 10;

/// Length of generated temporary secrets.
pub const TEMPORARY_SECRET_LEN: usize = 16;

/// Hash of a throwaway value, verified against when a login identifier is
/// unknown so that both failure paths pay one bcrypt comparison.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| bcrypt::hash(generate_temporary_secret(), BCRYPT_COST).ok());

/// Hash a password with bcrypt (cost 10).
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    bcrypt::hash(password, BCRYPT_COST)
        .map_err(|e| AuthError::Internal(format!("bcrypt hash: {e}")))
}

/// Verify a password against a bcrypt hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    bcrypt::verify(password, hash).map_err(|e| AuthError::Internal(format!("bcrypt verify: {e}")))
}

/// Burn one bcrypt comparison; the result is always discarded.
pub fn verify_dummy(password: &str) {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = bcrypt::verify(password, hash);
    }
}

/// Generate a one-time temporary secret (16 alphanumeric chars, thread-local CSPRNG).
pub fn generate_temporary_secret() -> String {
    rng()
        .sample_iter(&Alphanumeric)
        .take(TEMPORARY_SECRET_LEN)
        .map(char::from)
        .collect()
}
