//! Append-only audit sink.
//!
//! Audit is a non-critical telemetry channel: a failed append must never
//! fail the operation it describes. Failures are routed to the log at
//! warn level for the monitoring pipeline to pick up.

use std::sync::Arc;

use cosign_crypto::current_timestamp;
use cosign_storage::column_families::CF_AUDIT_LOGS;
use cosign_storage::Storage;
use tracing::warn;
use uuid::Uuid;

use crate::errors::Result;
use crate::types::AuditRecord;

/// Audit sink bound to one storage backend.
#[derive(Clone)]
pub struct AuditSink<S> {
    storage: Arc<S>,
}

impl<S: Storage> AuditSink<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// Append a record, best-effort. Secret material must never be placed
    /// in `detail`.
    pub async fn record(&self, user_id: Uuid, action: &str, detail: String, ip_address: &str) {
        let record = AuditRecord {
            id: Uuid::new_v4(),
            user_id,
            action: action.to_string(),
            detail,
            ip_address: ip_address.to_string(),
            created_at: current_timestamp(),
        };

        if let Err(e) = self.storage.put(CF_AUDIT_LOGS, &record.id, &record).await {
            warn!(action, %user_id, error = %e, "audit append failed");
        }
    }

    /// List records newest-first, optionally filtered by action and user.
    pub async fn list(
        &self,
        action: Option<&str>,
        user_id: Option<Uuid>,
    ) -> Result<Vec<AuditRecord>> {
        let mut records: Vec<AuditRecord> = self
            .storage
            .scan_all(CF_AUDIT_LOGS)
            .await?
            .into_iter()
            .map(|(_, record)| record)
            .filter(|r: &AuditRecord| action.map_or(true, |a| r.action == a))
            .filter(|r| user_id.map_or(true, |u| r.user_id == u))
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }
}
