//! Per-user persistence of server key shares.
//!
//! Secrets are wrapped with the process master key before they touch the
//! store and unwrapped only on use. Key initialization for one user is
//! serialized through a per-user async lock so concurrent calls linearize
//! into exactly one surviving share.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use cosign_crypto::protocol::CoopKeyPair;
use cosign_crypto::{current_timestamp, unwrap_share_secret, wrap_share_secret};
use cosign_storage::column_families::{CF_KEYS, CF_KEYS_BY_ID};
use cosign_storage::{Batch, BatchExt, Storage};
use rand::rngs::OsRng;
use uuid::Uuid;

use crate::errors::{Result, ServiceError};
use crate::types::{ShareRecord, STATUS_ENABLED};

/// Share store bound to one storage backend and master key.
pub struct ShareStore<S> {
    storage: Arc<S>,
    master_key: [u8; 32],
    locks: Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>,
}

impl<S: Storage> ShareStore<S> {
    pub fn new(storage: Arc<S>, master_key: [u8; 32]) -> Self {
        Self {
            storage,
            master_key,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// The serialization lock for one user's key material.
    pub fn user_lock(&self, user_id: Uuid) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().expect("share lock map poisoned");
        locks.entry(user_id).or_default().clone()
    }

    /// Wrap a freshly generated key pair into a persistable record.
    pub fn build_record(&self, user_id: Uuid, pair: &CoopKeyPair) -> Result<ShareRecord> {
        Ok(ShareRecord {
            id: Uuid::new_v4(),
            user_id,
            d2: wrap_share_secret(&self.master_key, &pair.d2, &user_id, &mut OsRng)?,
            d2_inv: wrap_share_secret(&self.master_key, &pair.d2_inv, &user_id, &mut OsRng)?,
            pa: pair.pa.to_vec(),
            status: STATUS_ENABLED,
            created_at: current_timestamp(),
        })
    }

    /// Queue the writes for one share into an existing batch.
    pub fn stage_write(&self, batch: &mut dyn Batch, record: &ShareRecord) -> Result<()> {
        batch.put(CF_KEYS, &record.user_id, record)?;
        batch.put(CF_KEYS_BY_ID, &record.id, &record.user_id)?;
        Ok(())
    }

    /// Queue the deletes for one share into an existing batch.
    pub fn stage_delete(&self, batch: &mut dyn Batch, record: &ShareRecord) -> Result<()> {
        batch.delete(CF_KEYS, &record.user_id)?;
        batch.delete(CF_KEYS_BY_ID, &record.id)?;
        Ok(())
    }

    /// Persist a new share. Fails with [`ServiceError::Conflict`] when the
    /// user already has one; callers decide between this and [`replace`]
    /// while holding the user lock.
    ///
    /// [`replace`]: ShareStore::replace
    pub async fn create(&self, record: &ShareRecord) -> Result<()> {
        if self.storage.exists(CF_KEYS, &record.user_id).await? {
            return Err(ServiceError::Conflict);
        }
        let mut batch = self.storage.batch();
        self.stage_write(batch.as_mut(), record)?;
        batch.commit().await?;
        Ok(())
    }

    /// Atomically swap a user's share for a new `(d2, d2_inv, pa)` tuple.
    ///
    /// The record keeps its identity; only the material changes. A single
    /// batched write means no partial update is ever observable.
    pub async fn replace(&self, record: &ShareRecord) -> Result<()> {
        let mut batch = self.storage.batch();
        self.stage_write(batch.as_mut(), record)?;
        batch.commit().await?;
        Ok(())
    }

    pub async fn get_by_user(&self, user_id: Uuid) -> Result<Option<ShareRecord>> {
        Ok(self.storage.get(CF_KEYS, &user_id).await?)
    }

    /// Resolve a share id to its owning user.
    pub async fn get_user_for_share(&self, share_id: Uuid) -> Result<Option<Uuid>> {
        Ok(self.storage.get(CF_KEYS_BY_ID, &share_id).await?)
    }

    /// Hard-delete a user's share. Returns the removed record, if any.
    pub async fn delete_by_user(&self, user_id: Uuid) -> Result<Option<ShareRecord>> {
        let Some(record) = self.get_by_user(user_id).await? else {
            return Ok(None);
        };
        let mut batch = self.storage.batch();
        self.stage_delete(batch.as_mut(), &record)?;
        batch.commit().await?;
        Ok(Some(record))
    }

    /// All shares, newest first.
    pub async fn list(&self) -> Result<Vec<ShareRecord>> {
        let mut records: Vec<ShareRecord> = self
            .storage
            .scan_all(CF_KEYS)
            .await?
            .into_iter()
            .map(|(_, record)| record)
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    /// Unwrap the stored `d2`.
    pub fn unwrap_d2(&self, record: &ShareRecord) -> Result<[u8; 32]> {
        Ok(unwrap_share_secret(
            &self.master_key,
            &record.d2,
            &record.user_id,
        )?)
    }

    /// Unwrap the stored `d2⁻¹`.
    pub fn unwrap_d2_inv(&self, record: &ShareRecord) -> Result<[u8; 32]> {
        Ok(unwrap_share_secret(
            &self.master_key,
            &record.d2_inv,
            &record.user_id,
        )?)
    }
}
