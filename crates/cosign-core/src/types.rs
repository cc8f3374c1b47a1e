//! Stored domain records.

use cosign_crypto::current_timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Record status: disabled.
pub const STATUS_DISABLED: u8 = 0;
/// Record status: enabled.
pub const STATUS_ENABLED: u8 = 1;

/// Audit action labels.
pub mod actions {
    pub const REGISTER: &str = "register";
    pub const LOGIN: &str = "login";
    pub const LOGOUT: &str = "logout";
    pub const KEY_GEN: &str = "key_gen";
    pub const SIGN: &str = "sign";
    pub const DECRYPT: &str = "decrypt";
    pub const USER_DELETE: &str = "user_delete";
    pub const KEY_DELETE: &str = "key_delete";
}

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    /// `hex(salt) ‖ hex(SM3(salt ‖ password))`; never leaves the process.
    pub password_verifier: String,
    pub status: u8,
    pub is_admin: bool,
    pub created_at: u64,
}

impl User {
    pub fn is_enabled(&self) -> bool {
        self.status == STATUS_ENABLED
    }
}

/// The server half of a user's cooperative key.
///
/// `d2` and `d2_inv` are stored wrapped (AEAD under the master key); `pa`
/// is the public joint key and safe to return to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Wrapped server secret share.
    pub d2: Vec<u8>,
    /// Wrapped cached inverse of `d2`.
    pub d2_inv: Vec<u8>,
    /// Joint public key, 64-byte `X ‖ Y` encoding.
    pub pa: Vec<u8>,
    pub status: u8,
    pub created_at: u64,
}

impl ShareRecord {
    pub fn is_enabled(&self) -> bool {
        self.status == STATUS_ENABLED
    }
}

/// A bearer session. The token string is also the storage key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: u64,
    pub created_at: u64,
}

impl Session {
    /// A session at or past its expiry instant is invalid, swept or not.
    pub fn is_expired(&self) -> bool {
        self.expires_at <= current_timestamp()
    }
}

/// Append-only audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub action: String,
    pub detail: String,
    pub ip_address: String,
    pub created_at: u64,
}

/// Clamp raw pagination parameters: pages are 1-based, page sizes land in
/// `[1, 100]` with a default of 10.
pub fn clamp_page(page: u64, page_size: u64) -> (usize, usize) {
    let page = if page < 1 { 1 } else { page } as usize;
    let page_size = if !(1..=100).contains(&page_size) {
        10
    } else {
        page_size as usize
    };
    (page, page_size)
}

/// Slice one page out of a fully sorted result set, returning the page
/// plus the total count.
pub fn paginate<T>(items: Vec<T>, page: usize, page_size: usize) -> (Vec<T>, u64) {
    let total = items.len() as u64;
    let start = (page - 1).saturating_mul(page_size);
    let page_items = items
        .into_iter()
        .skip(start)
        .take(page_size)
        .collect();
    (page_items, total)
}
