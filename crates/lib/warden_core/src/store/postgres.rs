//! PostgreSQL credential store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::{CredentialStore, StoreError};
use crate::models::credential::{Credential, CredentialPatch, NewCredential};

const COLUMNS: &str =
    "id, name, email, password_hash, must_change_password, created_at, updated_at";

type CredentialRow = (Uuid, String, String, String, bool, DateTime<Utc>, DateTime<Utc>);

fn from_row(row: CredentialRow) -> Credential {
    let (id, name, email, password_hash, must_change_password, created_at, updated_at) = row;
    Credential {
        id,
        name,
        email,
        password_hash,
        must_change_password,
        created_at,
        updated_at,
    }
}

/// Credential store backed by the `credentials` table.
#[derive(Clone, Debug)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run the embedded migrations from `warden_core/migrations/`.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    async fn exists(&self, id: Uuid) -> Result<bool, StoreError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM credentials WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Credential>, StoreError> {
        let row = sqlx::query_as::<_, CredentialRow>(&format!(
            "SELECT {COLUMNS} FROM credentials WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(from_row))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Credential>, StoreError> {
        let row = sqlx::query_as::<_, CredentialRow>(&format!(
            "SELECT {COLUMNS} FROM credentials WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(from_row))
    }

    async fn list(&self) -> Result<Vec<Credential>, StoreError> {
        let rows = sqlx::query_as::<_, CredentialRow>(&format!(
            "SELECT {COLUMNS} FROM credentials ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(from_row).collect())
    }

    async fn insert(&self, new: NewCredential) -> Result<Credential, StoreError> {
        // Uniqueness comes from the `credentials_email_key` constraint, not a pre-check.
        let result = sqlx::query_as::<_, CredentialRow>(&format!(
            "INSERT INTO credentials (id, name, email, password_hash, must_change_password) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {COLUMNS}"
        ))
        .bind(new.id)
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(new.must_change_password)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(from_row(row)),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                debug!(email = %new.email, "insert rejected by unique constraint");
                Err(StoreError::Duplicate(new.email))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update_fields(
        &self,
        id: Uuid,
        patch: CredentialPatch,
    ) -> Result<Credential, StoreError> {
        let row = sqlx::query_as::<_, CredentialRow>(&format!(
            "UPDATE credentials SET \
               name = COALESCE($2, name), \
               password_hash = COALESCE($3, password_hash), \
               must_change_password = COALESCE($4, must_change_password), \
               updated_at = now() \
             WHERE id = $1 AND ($5::text IS NULL OR password_hash = $5) \
             RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(patch.name)
        .bind(patch.password_hash)
        .bind(patch.must_change_password)
        .bind(patch.expected_hash)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return if self.exists(id).await? {
                Err(StoreError::Stale)
            } else {
                Err(StoreError::NotFound)
            };
        };
        Ok(from_row(row))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM credentials WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
