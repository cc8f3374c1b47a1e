//! User-facing endpoints: register, login, logout, user info.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::helpers::{b64, decode_b64, rfc3339};
use crate::error::{ApiError, ApiResponse};
use crate::extractors::{bearer_token, AuthUser, ClientIp};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub p1: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub user_id: String,
    pub public_key: String,
    pub p2: String,
}

/// POST /api/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    ClientIp(ip): ClientIp,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<RegisterResponse>>, ApiError> {
    let Json(req) = payload.map_err(|_| ApiError::InvalidParam)?;
    let p1 = decode_b64(&req.p1)?;

    let outcome = state
        .users
        .register(&req.username, &req.password, &p1, &ip)
        .await?;

    Ok(ApiResponse::ok(RegisterResponse {
        user_id: outcome.user.id.to_string(),
        public_key: b64(&outcome.pa),
        p2: b64(&outcome.p2),
    }))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: String,
    pub user_id: String,
}

/// POST /api/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    ClientIp(ip): ClientIp,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    let Json(req) = payload.map_err(|_| ApiError::InvalidParam)?;

    let session = state.users.login(&req.username, &req.password, &ip).await?;

    Ok(ApiResponse::ok(LoginResponse {
        token: session.token,
        expires_at: rfc3339(session.expires_at),
        user_id: session.user_id.to_string(),
    }))
}

/// POST /api/logout
///
/// Idempotent: succeeds with or without a live session.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    ClientIp(ip): ClientIp,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    if let Some(token) = bearer_token(&headers) {
        state.users.logout(&token, &ip).await?;
    }
    Ok(ApiResponse::empty())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfoResponse {
    pub user_id: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    pub status: u8,
    pub created_at: String,
}

/// GET /api/user/info
pub async fn user_info(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<UserInfoResponse>>, ApiError> {
    let user = auth.user;

    // The joint public key lives on the share; absent for admin accounts.
    let public_key = match state.cosign.get_share(user.id).await {
        Ok(share) => Some(b64(&share.pa)),
        Err(cosign_core::ServiceError::KeyNotFound) => None,
        Err(e) => return Err(e.into()),
    };

    Ok(ApiResponse::ok(UserInfoResponse {
        user_id: user.id.to_string(),
        username: user.username,
        public_key,
        status: user.status,
        created_at: rfc3339(user.created_at),
    }))
}
