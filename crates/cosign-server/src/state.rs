//! Shared application state.

use std::sync::Arc;

use anyhow::Result;
use cosign_core::{AuditSink, CosignService, ShareStore, UserService};
use cosign_storage::RocksDbStorage;

use crate::config::Config;

/// Application state threaded through all handlers.
pub struct AppState {
    pub config: Config,
    /// Direct storage handle for health checks and admin stats.
    pub storage: Arc<RocksDbStorage>,
    pub users: UserService<RocksDbStorage>,
    pub cosign: CosignService<RocksDbStorage>,
    pub audit: AuditSink<RocksDbStorage>,
}

impl AppState {
    /// Open the configured database and wire up the services.
    pub async fn new(config: Config) -> Result<Self> {
        let storage = Arc::new(RocksDbStorage::open(&config.database.path)?);
        Self::with_storage(config, storage).await
    }

    /// Build state over an already-open store (tests use a throwaway one).
    pub async fn with_storage(config: Config, storage: Arc<RocksDbStorage>) -> Result<Self> {
        let master_key = config.master_key()?;

        let shares = Arc::new(ShareStore::new(storage.clone(), master_key));
        let audit = AuditSink::new(storage.clone());
        let users = UserService::new(
            storage.clone(),
            shares.clone(),
            audit.clone(),
            config.auth.token_expire,
        );
        let cosign = CosignService::new(shares, audit.clone());

        users
            .ensure_admin(&config.admin.username, &config.admin.password)
            .await?;

        Ok(AppState {
            config,
            storage,
            users,
            cosign,
            audit,
        })
    }
}
