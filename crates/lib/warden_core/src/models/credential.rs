//! Credential domain models.
//!
//! These are internal domain models, distinct from the API request/response
//! models (which have `#[serde(rename)]` for camelCase etc.).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One user's authentication identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// bcrypt hash; never the plaintext.
    pub password_hash: String,
    /// Set while the credential uses a provisional secret.
    pub must_change_password: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Credential {
    pub fn state(&self) -> PasswordState {
        if self.must_change_password {
            PasswordState::MustChange
        } else {
            PasswordState::Active
        }
    }
}

/// Password lifecycle state derived from `must_change_password`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordState {
    Active,
    MustChange,
}

/// Values for inserting a new credential.
#[derive(Debug, Clone)]
pub struct NewCredential {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub must_change_password: bool,
}

/// Partial update applied atomically to a single credential.
///
/// `None` fields are left untouched. When `expected_hash` is set the update
/// only applies if the stored hash still equals it.
#[derive(Debug, Clone, Default)]
pub struct CredentialPatch {
    pub name: Option<String>,
    pub password_hash: Option<String>,
    pub must_change_password: Option<bool>,
    pub expected_hash: Option<String>,
}

impl CredentialPatch {
    /// Replace the hash and set the lifecycle flag, guarded on `current_hash`.
    pub fn password(current_hash: &str, new_hash: String, must_change: bool) -> Self {
        Self {
            password_hash: Some(new_hash),
            must_change_password: Some(must_change),
            expected_hash: Some(current_hash.to_string()),
            ..Self::default()
        }
    }

    /// True when the patch changes no field.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.password_hash.is_none() && self.must_change_password.is_none()
    }
}

/// Claims carried by signed tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: credential id for session tokens, email for reset tokens.
    pub sub: String,
}

impl TokenClaims {
    pub fn new(sub: impl Into<String>) -> Self {
        Self { sub: sub.into() }
    }
}
