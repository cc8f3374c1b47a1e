//! Background sweep of expired sessions.
//!
//! Validation re-checks expiry on every request, so the sweep only bounds
//! storage growth; a failed run changes nothing about correctness.

use std::sync::Arc;
use std::time::Duration;

use cosign_storage::column_families::{CF_SESSIONS, CF_SESSIONS_BY_USER};
use cosign_storage::{BatchExt, Storage};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::types::Session;

/// Sweep cadence.
pub const SWEEP_INTERVAL_SECS: u64 = 60;

/// Delete all sessions at or past their expiry. Returns how many were
/// removed.
pub async fn sweep_expired_sessions<S: Storage>(storage: &S) -> Result<usize> {
    let sessions: Vec<(Vec<u8>, Session)> = storage.scan_all(CF_SESSIONS).await?;

    let mut removed = 0;
    for (_, session) in sessions {
        if !session.is_expired() {
            continue;
        }
        let mut batch = storage.batch();
        batch.delete(CF_SESSIONS, &session.token)?;
        batch.delete(
            CF_SESSIONS_BY_USER,
            &(session.user_id, session.token.clone()),
        )?;
        batch.commit().await?;
        removed += 1;
    }

    if removed > 0 {
        info!(removed, "expired sessions swept");
    } else {
        debug!("session sweep found nothing to remove");
    }
    Ok(removed)
}

/// Spawn the periodic sweeper task.
pub fn spawn_session_sweeper<S: Storage + 'static>(storage: Arc<S>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(SWEEP_INTERVAL_SECS));
        loop {
            interval.tick().await;
            if let Err(e) = sweep_expired_sessions(storage.as_ref()).await {
                warn!(error = %e, "session sweep failed");
            }
        }
    })
}
