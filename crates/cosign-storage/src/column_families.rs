//! RocksDB column family definitions.
//!
//! One column family per logical table, plus index families for lookups
//! the primary key does not cover.

/// User records: user_id → User
pub const CF_USERS: &str = "users";

/// Username index: username → user_id
pub const CF_USERS_BY_USERNAME: &str = "users_by_username";

/// Key shares: user_id → ShareRecord (at most one share per user)
pub const CF_KEYS: &str = "keys";

/// Share id index: share_id → user_id
pub const CF_KEYS_BY_ID: &str = "keys_by_id";

/// Sessions: token → Session
pub const CF_SESSIONS: &str = "sessions";

/// Sessions by user index: (user_id, token) → ()
pub const CF_SESSIONS_BY_USER: &str = "sessions_by_user";

/// Audit records: audit_id → AuditRecord (append-only)
pub const CF_AUDIT_LOGS: &str = "audit_logs";

/// Get all column family names
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        CF_USERS,
        CF_USERS_BY_USERNAME,
        CF_KEYS,
        CF_KEYS_BY_ID,
        CF_SESSIONS,
        CF_SESSIONS_BY_USER,
        CF_AUDIT_LOGS,
    ]
}
