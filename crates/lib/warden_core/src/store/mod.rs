//! Credential persistence.
//!
//! The [`CredentialStore`] trait is the only shared mutable resource in the
//! credential lifecycle. Implementations guarantee single-record atomicity
//! and enforce email uniqueness themselves.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::credential::{Credential, CredentialPatch, NewCredential};

pub use memory::MemoryCredentialStore;
pub use postgres::PgCredentialStore;

/// Store-level errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Another credential already uses this email.
    #[error("email already registered: {0}")]
    Duplicate(String),

    #[error("credential not found")]
    NotFound,

    /// A guarded update found the record changed since it was read.
    #[error("credential changed since it was read")]
    Stale,

    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

/// Repository over credential records.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Credential>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Credential>, StoreError>;

    /// All credentials, oldest first.
    async fn list(&self) -> Result<Vec<Credential>, StoreError>;

    /// Insert a new record. Fails with [`StoreError::Duplicate`] if the email is taken.
    async fn insert(&self, new: NewCredential) -> Result<Credential, StoreError>;

    /// Apply `patch` atomically. Fails with [`StoreError::NotFound`] for an
    /// unknown id and [`StoreError::Stale`] when `patch.expected_hash` no
    /// longer matches.
    async fn update_fields(
        &self,
        id: Uuid,
        patch: CredentialPatch,
    ) -> Result<Credential, StoreError>;

    /// Remove a record. Returns `false` if it did not exist.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}
