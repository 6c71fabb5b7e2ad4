//! Authentication and authorization logic.
//!
//! Provides password hashing, signed token management and constant-time
//! secret comparison shared by the lifecycle manager and `warden_api`.

pub mod jwt;
pub mod password;

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::store::StoreError;

/// Authentication and credential lifecycle errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Missing, malformed or expired token, or a bad login credential.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Static provisioning secret mismatch.
    #[error("Not authorized: {0}")]
    Authorization(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// A reset token was presented for a credential with no pending reset.
    #[error("Unqualified: {0}")]
    Unqualified(String),

    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate(email) => {
                AuthError::Conflict(format!("already exists a user with e-mail {email}"))
            }
            StoreError::NotFound => AuthError::NotFound("user not found".into()),
            StoreError::Stale => {
                AuthError::Conflict("credential was modified concurrently, retry".into())
            }
            StoreError::Db(e) => AuthError::DbError(e),
        }
    }
}

/// Compare two secrets without leaking the position of the first mismatch.
///
/// Both inputs are reduced to SHA-256 digests first so the comparison length
/// does not depend on the secret length either.
pub fn secrets_match(supplied: &str, expected: &str) -> bool {
    let a = Sha256::digest(supplied.as_bytes());
    let b = Sha256::digest(expected.as_bytes());
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
