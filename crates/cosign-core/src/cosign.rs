//! Cooperative signing operations bound to a user's stored share.
//!
//! Identity always arrives here pre-resolved from the session layer; these
//! methods never trust a caller-supplied user id.

use std::sync::Arc;

use cosign_crypto::protocol::{self, CoopSignature};
use cosign_storage::Storage;
use rand::rngs::OsRng;
use tracing::info;
use uuid::Uuid;
use zeroize::Zeroize;

use crate::audit::AuditSink;
use crate::errors::{Result, ServiceError};
use crate::shares::ShareStore;
use crate::types::{actions, ShareRecord};

/// Outcome of key initialization.
pub struct KeyInitOutcome {
    /// Server public component for the client, 64 bytes.
    pub p2: [u8; 64],
    /// Joint public key, 64 bytes.
    pub pa: [u8; 64],
}

/// Cosign service bound to one storage backend.
pub struct CosignService<S> {
    shares: Arc<ShareStore<S>>,
    audit: AuditSink<S>,
}

impl<S: Storage> CosignService<S> {
    pub fn new(shares: Arc<ShareStore<S>>, audit: AuditSink<S>) -> Self {
        Self { shares, audit }
    }

    /// Generate (or regenerate) the user's key share from a fresh client
    /// component `p1`.
    ///
    /// Concurrent calls for the same user serialize on the share store's
    /// per-user lock: exactly one result becomes the post-state, and the
    /// record count never exceeds one share per user.
    pub async fn key_init(&self, user_id: Uuid, p1: &[u8], ip: &str) -> Result<KeyInitOutcome> {
        let pair = protocol::keygen_init(p1, &mut OsRng)?;

        let lock = self.shares.user_lock(user_id);
        let _guard = lock.lock().await;

        let mut record = self.shares.build_record(user_id, &pair)?;
        match self.shares.get_by_user(user_id).await? {
            Some(existing) => {
                // Same row, new material: the share keeps its identity.
                record.id = existing.id;
                record.created_at = existing.created_at;
                self.shares.replace(&record).await?;
            }
            None => self.shares.create(&record).await?,
        }

        self.audit
            .record(user_id, actions::KEY_GEN, String::new(), ip)
            .await;
        info!(%user_id, "key share initialized");

        Ok(KeyInitOutcome {
            p2: pair.p2,
            pa: pair.pa,
        })
    }

    /// Produce the server's partial signature over digest `e` with the
    /// client nonce point `q1`.
    pub async fn sign(
        &self,
        user_id: Uuid,
        q1: &[u8],
        e: &[u8; 32],
        ip: &str,
    ) -> Result<CoopSignature> {
        let record = self.require_share(user_id).await?;

        let mut d2 = self.shares.unwrap_d2(&record)?;
        let result = protocol::sign(&d2, q1, e, &mut OsRng);
        d2.zeroize();
        let signature = result?;

        self.audit
            .record(user_id, actions::SIGN, String::new(), ip)
            .await;

        Ok(signature)
    }

    /// Apply the server's decryption transform to the client point `t1`.
    pub async fn decrypt(&self, user_id: Uuid, t1: &[u8], ip: &str) -> Result<[u8; 64]> {
        let record = self.require_share(user_id).await?;

        let mut d2_inv = self.shares.unwrap_d2_inv(&record)?;
        let result = protocol::decrypt(&d2_inv, t1);
        d2_inv.zeroize();
        let t2 = result?;

        self.audit
            .record(user_id, actions::DECRYPT, String::new(), ip)
            .await;

        Ok(t2)
    }

    /// The user's share record (public fields are safe to expose).
    pub async fn get_share(&self, user_id: Uuid) -> Result<ShareRecord> {
        self.require_share(user_id).await
    }

    /// All shares, newest first.
    pub async fn list_shares(&self) -> Result<Vec<ShareRecord>> {
        self.shares.list().await
    }

    /// Administrative hard delete by share id.
    pub async fn delete_share(&self, share_id: Uuid, ip: &str) -> Result<()> {
        let user_id = self
            .shares
            .get_user_for_share(share_id)
            .await?
            .ok_or(ServiceError::KeyNotFound)?;

        let lock = self.shares.user_lock(user_id);
        let _guard = lock.lock().await;
        self.shares.delete_by_user(user_id).await?;

        self.audit
            .record(user_id, actions::KEY_DELETE, String::new(), ip)
            .await;
        info!(%user_id, %share_id, "key share deleted");
        Ok(())
    }

    async fn require_share(&self, user_id: Uuid) -> Result<ShareRecord> {
        let record = self
            .shares
            .get_by_user(user_id)
            .await?
            .ok_or(ServiceError::KeyNotFound)?;
        if !record.is_enabled() {
            return Err(ServiceError::KeyNotFound);
        }
        Ok(record)
    }
}
