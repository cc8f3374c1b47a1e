//! User lifecycle and bearer sessions.

use std::sync::Arc;

use cosign_crypto::protocol;
use cosign_crypto::{
    current_timestamp, generate_salt, generate_token, make_password_verifier, verify_password,
};
use cosign_storage::column_families::{
    CF_SESSIONS, CF_SESSIONS_BY_USER, CF_USERS, CF_USERS_BY_USERNAME,
};
use cosign_storage::{BatchExt, Storage};
use rand::rngs::OsRng;
use tracing::info;
use uuid::Uuid;

use crate::audit::AuditSink;
use crate::errors::{Result, ServiceError};
use crate::shares::ShareStore;
use crate::types::{actions, Session, User, STATUS_DISABLED, STATUS_ENABLED};

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 32;
const PASSWORD_MIN: usize = 6;
const PASSWORD_MAX: usize = 64;

/// Outcome of a successful registration.
pub struct RegisterOutcome {
    pub user: User,
    /// Server public component for the client, 64 bytes.
    pub p2: [u8; 64],
    /// Joint public key, 64 bytes.
    pub pa: [u8; 64],
}

/// User service bound to one storage backend.
pub struct UserService<S> {
    storage: Arc<S>,
    shares: Arc<ShareStore<S>>,
    audit: AuditSink<S>,
    token_ttl: u64,
    // Serializes the username existence check against the insert.
    register_lock: tokio::sync::Mutex<()>,
}

impl<S: Storage> UserService<S> {
    pub fn new(
        storage: Arc<S>,
        shares: Arc<ShareStore<S>>,
        audit: AuditSink<S>,
        token_ttl: u64,
    ) -> Self {
        Self {
            storage,
            shares,
            audit,
            token_ttl,
            register_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Register a user and generate their first key share in one atomic
    /// write: either both the user and the share land, or neither does.
    pub async fn register(&self, username: &str, password: &str, p1: &[u8], ip: &str) -> Result<RegisterOutcome> {
        if !(USERNAME_MIN..=USERNAME_MAX).contains(&username.chars().count())
            || !(PASSWORD_MIN..=PASSWORD_MAX).contains(&password.chars().count())
        {
            return Err(ServiceError::InvalidParam);
        }

        let _guard = self.register_lock.lock().await;

        if self
            .storage
            .exists(CF_USERS_BY_USERNAME, &username)
            .await?
        {
            return Err(ServiceError::UserExists);
        }

        let pair = protocol::keygen_init(p1, &mut OsRng)?;

        let salt = generate_salt(&mut OsRng)?;
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_verifier: make_password_verifier(password.as_bytes(), &salt),
            status: STATUS_ENABLED,
            is_admin: false,
            created_at: current_timestamp(),
        };
        let share = self.shares.build_record(user.id, &pair)?;

        let mut batch = self.storage.batch();
        batch.put(CF_USERS, &user.id, &user)?;
        batch.put(CF_USERS_BY_USERNAME, &username, &user.id)?;
        self.shares.stage_write(batch.as_mut(), &share)?;
        batch.commit().await?;

        self.audit
            .record(
                user.id,
                actions::REGISTER,
                format!(r#"{{"username":"{}"}}"#, username),
                ip,
            )
            .await;
        info!(user_id = %user.id, "user registered");

        Ok(RegisterOutcome {
            user,
            p2: pair.p2,
            pa: pair.pa,
        })
    }

    /// Create the administrative user from configuration if it does not
    /// exist yet. The admin holds no key share.
    pub async fn ensure_admin(&self, username: &str, password: &str) -> Result<()> {
        let _guard = self.register_lock.lock().await;

        if self
            .storage
            .exists(CF_USERS_BY_USERNAME, &username)
            .await?
        {
            return Ok(());
        }

        let salt = generate_salt(&mut OsRng)?;
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_verifier: make_password_verifier(password.as_bytes(), &salt),
            status: STATUS_ENABLED,
            is_admin: true,
            created_at: current_timestamp(),
        };

        let mut batch = self.storage.batch();
        batch.put(CF_USERS, &user.id, &user)?;
        batch.put(CF_USERS_BY_USERNAME, &username, &user.id)?;
        batch.commit().await?;

        info!(username, "admin user created");
        Ok(())
    }

    /// Password login. Issues a fresh bearer token with the configured
    /// time to live.
    pub async fn login(&self, username: &str, password: &str, ip: &str) -> Result<Session> {
        let user_id: Uuid = self
            .storage
            .get(CF_USERS_BY_USERNAME, &username)
            .await?
            .ok_or(ServiceError::UserNotFound)?;
        let user: User = self
            .storage
            .get(CF_USERS, &user_id)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        if !verify_password(password.as_bytes(), &user.password_verifier)? {
            return Err(ServiceError::PasswordError);
        }
        if !user.is_enabled() {
            return Err(ServiceError::UserDisabled);
        }

        let now = current_timestamp();
        let session = Session {
            token: generate_token(&mut OsRng)?,
            user_id: user.id,
            expires_at: now + self.token_ttl,
            created_at: now,
        };

        let mut batch = self.storage.batch();
        batch.put(CF_SESSIONS, &session.token, &session)?;
        batch.put(
            CF_SESSIONS_BY_USER,
            &(session.user_id, session.token.clone()),
            &session.token,
        )?;
        batch.commit().await?;

        self.audit
            .record(user.id, actions::LOGIN, String::new(), ip)
            .await;

        Ok(session)
    }

    /// Delete the session behind `token`. Idempotent.
    pub async fn logout(&self, token: &str, ip: &str) -> Result<()> {
        let Some(session) = self
            .storage
            .get::<_, Session>(CF_SESSIONS, &token)
            .await?
        else {
            return Ok(());
        };

        self.delete_session(&session).await?;
        self.audit
            .record(session.user_id, actions::LOGOUT, String::new(), ip)
            .await;
        Ok(())
    }

    /// Validate a bearer token and resolve the identity it belongs to.
    ///
    /// The returned `user_id` is authoritative for the request; any
    /// caller-supplied identity is ignored downstream.
    pub async fn validate_session(&self, token: &str) -> Result<(Session, User)> {
        let session: Session = self
            .storage
            .get(CF_SESSIONS, &token)
            .await?
            .ok_or(ServiceError::TokenInvalid)?;

        if session.is_expired() {
            self.delete_session(&session).await?;
            return Err(ServiceError::TokenExpired);
        }

        let user: User = self
            .storage
            .get(CF_USERS, &session.user_id)
            .await?
            .ok_or(ServiceError::TokenInvalid)?;
        if !user.is_enabled() {
            return Err(ServiceError::UserDisabled);
        }

        Ok((session, user))
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<User> {
        self.storage
            .get(CF_USERS, &user_id)
            .await?
            .ok_or(ServiceError::UserNotFound)
    }

    /// Delete a user and cascade to their share and sessions. The share
    /// is purged in the same batch; no tombstone survives.
    pub async fn delete_user(&self, user_id: Uuid, ip: &str) -> Result<()> {
        let user = self.get_user(user_id).await?;

        let mut batch = self.storage.batch();
        batch.delete(CF_USERS, &user.id)?;
        batch.delete(CF_USERS_BY_USERNAME, &user.username)?;

        if let Some(share) = self.shares.get_by_user(user_id).await? {
            self.shares.stage_delete(batch.as_mut(), &share)?;
        }

        let sessions: Vec<(Vec<u8>, String)> = self
            .storage
            .get_by_prefix(CF_SESSIONS_BY_USER, &user_id)
            .await?;
        for (index_key, token) in sessions {
            batch.delete(CF_SESSIONS, &token)?;
            batch.delete_raw(CF_SESSIONS_BY_USER, index_key)?;
        }

        batch.commit().await?;

        self.audit
            .record(
                user_id,
                actions::USER_DELETE,
                format!(r#"{{"username":"{}"}}"#, user.username),
                ip,
            )
            .await;
        info!(%user_id, "user deleted");
        Ok(())
    }

    /// Enable or disable a user.
    pub async fn set_user_status(&self, user_id: Uuid, status: u8) -> Result<()> {
        if status != STATUS_ENABLED && status != STATUS_DISABLED {
            return Err(ServiceError::InvalidParam);
        }
        let mut user = self.get_user(user_id).await?;
        user.status = status;
        self.storage.put(CF_USERS, &user.id, &user).await?;
        Ok(())
    }

    /// All users, newest first.
    pub async fn list_users(&self) -> Result<Vec<User>> {
        let mut users: Vec<User> = self
            .storage
            .scan_all(CF_USERS)
            .await?
            .into_iter()
            .map(|(_, user)| user)
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn delete_session(&self, session: &Session) -> Result<()> {
        let mut batch = self.storage.batch();
        batch.delete(CF_SESSIONS, &session.token)?;
        batch.delete(
            CF_SESSIONS_BY_USER,
            &(session.user_id, session.token.clone()),
        )?;
        batch.commit().await?;
        Ok(())
    }
}
