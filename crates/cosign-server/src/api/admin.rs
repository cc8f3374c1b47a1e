//! Operator endpoints under `/mapi/*`.
//!
//! Gated behind a bearer session whose user carries the admin flag.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use cosign_core::types::{clamp_page, paginate};
use cosign_core::{AuditRecord, ShareRecord, User};
use cosign_storage::column_families::{CF_AUDIT_LOGS, CF_KEYS, CF_SESSIONS, CF_USERS};
use cosign_storage::Storage;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::helpers::{b64, rfc3339};
use crate::error::{ApiError, ApiResponse};
use crate::extractors::{AdminUser, ClientIp};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u64,
}

fn default_page() -> u64 {
    1
}

fn default_page_size() -> u64 {
    10
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    pub list: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub status: u8,
    pub is_admin: bool,
    pub created_at: String,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username,
            status: user.status,
            is_admin: user.is_admin,
            created_at: rfc3339(user.created_at),
        }
    }
}

/// Public projection of a share record; the wrapped secrets never leave
/// the process.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareSummary {
    pub id: String,
    pub user_id: String,
    pub public_key: String,
    pub status: u8,
    pub created_at: String,
}

impl From<ShareRecord> for ShareSummary {
    fn from(share: ShareRecord) -> Self {
        Self {
            id: share.id.to_string(),
            user_id: share.user_id.to_string(),
            public_key: b64(&share.pa),
            status: share.status,
            created_at: rfc3339(share.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditSummary {
    pub id: String,
    pub user_id: String,
    pub action: String,
    pub detail: String,
    pub ip_address: String,
    pub created_at: String,
}

impl From<AuditRecord> for AuditSummary {
    fn from(record: AuditRecord) -> Self {
        Self {
            id: record.id.to_string(),
            user_id: record.user_id.to_string(),
            action: record.action,
            detail: record.detail,
            ip_address: record.ip_address,
            created_at: rfc3339(record.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// GET /mapi/health
pub async fn health(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Result<Json<ApiResponse<HealthResponse>>, ApiError> {
    // A trivial read proves the store is reachable.
    state
        .storage
        .count(CF_USERS)
        .await
        .map_err(cosign_core::ServiceError::from)?;
    Ok(ApiResponse::ok(HealthResponse { status: "ok" }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub users: u64,
    pub keys: u64,
    pub sessions: u64,
    pub audit_logs: u64,
}

/// GET /mapi/stats
pub async fn stats(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Result<Json<ApiResponse<StatsResponse>>, ApiError> {
    let storage = &state.storage;
    let stats = StatsResponse {
        users: count(storage, CF_USERS).await?,
        keys: count(storage, CF_KEYS).await?,
        sessions: count(storage, CF_SESSIONS).await?,
        audit_logs: count(storage, CF_AUDIT_LOGS).await?,
    };
    Ok(ApiResponse::ok(stats))
}

async fn count(storage: &Arc<cosign_storage::RocksDbStorage>, cf: &str) -> Result<u64, ApiError> {
    storage
        .count(cf)
        .await
        .map_err(|e| cosign_core::ServiceError::from(e).into())
}

/// GET /mapi/users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<PageResponse<UserSummary>>>, ApiError> {
    let (page, page_size) = clamp_page(query.page, query.page_size);
    let users = state.users.list_users().await?;
    let (items, total) = paginate(users, page, page_size);

    Ok(ApiResponse::ok(PageResponse {
        list: items.into_iter().map(UserSummary::from).collect(),
        total,
        page: page as u64,
        page_size: page_size as u64,
    }))
}

/// GET /mapi/users/:id
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<UserSummary>>, ApiError> {
    let user_id = parse_uuid(&id)?;
    let user = state.users.get_user(user_id).await?;
    Ok(ApiResponse::ok(user.into()))
}

/// DELETE /mapi/users/:id
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    ClientIp(ip): ClientIp,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let user_id = parse_uuid(&id)?;
    state.users.delete_user(user_id, &ip).await?;
    Ok(ApiResponse::empty())
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: u8,
}

/// PUT /mapi/users/:id/status
pub async fn update_user_status(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let Json(req) = payload.map_err(|_| ApiError::InvalidParam)?;
    let user_id = parse_uuid(&id)?;
    state.users.set_user_status(user_id, req.status).await?;
    Ok(ApiResponse::empty())
}

/// GET /mapi/keys
pub async fn list_keys(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<PageResponse<ShareSummary>>>, ApiError> {
    let (page, page_size) = clamp_page(query.page, query.page_size);
    let shares = state.cosign.list_shares().await?;
    let (items, total) = paginate(shares, page, page_size);

    Ok(ApiResponse::ok(PageResponse {
        list: items.into_iter().map(ShareSummary::from).collect(),
        total,
        page: page as u64,
        page_size: page_size as u64,
    }))
}

/// DELETE /mapi/keys/:id
pub async fn delete_key(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    ClientIp(ip): ClientIp,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let share_id = parse_uuid(&id)?;
    state.cosign.delete_share(share_id, &ip).await?;
    Ok(ApiResponse::empty())
}

#[derive(Debug, Deserialize)]
pub struct LogQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    pub action: Option<String>,
    pub user_id: Option<String>,
}

/// GET /mapi/logs
pub async fn list_logs(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(query): Query<LogQuery>,
) -> Result<Json<ApiResponse<PageResponse<AuditSummary>>>, ApiError> {
    let (page, page_size) = clamp_page(query.page, query.page_size);
    let user_filter = match &query.user_id {
        Some(raw) => Some(parse_uuid(raw)?),
        None => None,
    };

    let records = state
        .audit
        .list(query.action.as_deref(), user_filter)
        .await?;
    let (items, total) = paginate(records, page, page_size);

    Ok(ApiResponse::ok(PageResponse {
        list: items.into_iter().map(AuditSummary::from).collect(),
        total,
        page: page as u64,
        page_size: page_size as u64,
    }))
}

fn parse_uuid(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::InvalidParam)
}
