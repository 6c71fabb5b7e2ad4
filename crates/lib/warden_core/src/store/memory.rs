//! In-memory credential store.
//!
//! Backs tests and local development. Every operation runs under a single
//! lock, so insert-with-uniqueness and guarded updates are atomic.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CredentialStore, StoreError};
use crate::models::credential::{Credential, CredentialPatch, NewCredential};

#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    records: RwLock<HashMap<Uuid, Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Credential>, StoreError> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Credential>, StoreError> {
        let records = self.records.read().await;
        Ok(records.values().find(|c| c.email == email).cloned())
    }

    async fn list(&self) -> Result<Vec<Credential>, StoreError> {
        let mut all: Vec<Credential> = self.records.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(all)
    }

    async fn insert(&self, new: NewCredential) -> Result<Credential, StoreError> {
        let mut records = self.records.write().await;
        if records.values().any(|c| c.email == new.email) {
            return Err(StoreError::Duplicate(new.email));
        }
        let now = Utc::now();
        let credential = Credential {
            id: new.id,
            name: new.name,
            email: new.email,
            password_hash: new.password_hash,
            must_change_password: new.must_change_password,
            created_at: now,
            updated_at: now,
        };
        records.insert(credential.id, credential.clone());
        Ok(credential)
    }

    async fn update_fields(
        &self,
        id: Uuid,
        patch: CredentialPatch,
    ) -> Result<Credential, StoreError> {
        let mut records = self.records.write().await;
        let record = records.get_mut(&id).ok_or(StoreError::NotFound)?;
        if let Some(expected) = &patch.expected_hash
            && *expected != record.password_hash
        {
            return Err(StoreError::Stale);
        }
        if let Some(name) = patch.name {
            record.name = name;
        }
        if let Some(hash) = patch.password_hash {
            record.password_hash = hash;
        }
        if let Some(flag) = patch.must_change_password {
            record.must_change_password = flag;
        }
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.records.write().await.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_credential(email: &str) -> NewCredential {
        NewCredential {
            id: Uuid::now_v7(),
            name: "Alice".into(),
            email: email.into(),
            password_hash: "hash-1".into(),
            must_change_password: true,
        }
    }

    #[tokio::test]
    async fn insert_enforces_unique_email() {
        let store = MemoryCredentialStore::new();
        store.insert(new_credential("a@x.com")).await.unwrap();
        let err = store.insert(new_credential("a@x.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(e) if e == "a@x.com"));
    }

    #[tokio::test]
    async fn concurrent_inserts_admit_exactly_one() {
        let store = std::sync::Arc::new(MemoryCredentialStore::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.insert(new_credential("race@x.com")).await.is_ok()
            }));
        }
        let mut ok = 0;
        for h in handles {
            if h.await.unwrap() {
                ok += 1;
            }
        }
        assert_eq!(ok, 1);
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn guarded_update_detects_stale_hash() {
        let store = MemoryCredentialStore::new();
        let created = store.insert(new_credential("a@x.com")).await.unwrap();

        let patch = CredentialPatch::password("other-hash", "hash-2".into(), false);
        let err = store.update_fields(created.id, patch).await.unwrap_err();
        assert!(matches!(err, StoreError::Stale));

        let patch = CredentialPatch::password("hash-1", "hash-2".into(), false);
        let updated = store.update_fields(created.id, patch).await.unwrap();
        assert_eq!(updated.password_hash, "hash-2");
        assert!(!updated.must_change_password);
    }

    #[tokio::test]
    async fn update_and_delete_unknown_id() {
        let store = MemoryCredentialStore::new();
        let err = store
            .update_fields(Uuid::now_v7(), CredentialPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
        assert!(!store.delete(Uuid::now_v7()).await.unwrap());
    }
}
