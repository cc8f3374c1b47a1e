//! Cooperative protocol endpoints: key init, sign, decrypt.
//!
//! All three resolve the acting user from the session; a `userId` field in
//! the body is ignored by construction.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::helpers::{b64, decode_b64, decode_digest};
use crate::error::{ApiError, ApiResponse};
use crate::extractors::{AuthUser, ClientIp};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct KeyInitRequest {
    pub p1: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyInitResponse {
    pub p2: String,
    pub public_key: String,
}

/// POST /api/key/init
pub async fn key_init(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ClientIp(ip): ClientIp,
    payload: Result<Json<KeyInitRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<KeyInitResponse>>, ApiError> {
    let Json(req) = payload.map_err(|_| ApiError::InvalidParam)?;
    let p1 = decode_b64(&req.p1)?;

    let outcome = state.cosign.key_init(auth.user.id, &p1, &ip).await?;

    Ok(ApiResponse::ok(KeyInitResponse {
        p2: b64(&outcome.p2),
        public_key: b64(&outcome.pa),
    }))
}

#[derive(Debug, Deserialize)]
pub struct SignRequest {
    pub q1: String,
    pub e: String,
}

#[derive(Debug, Serialize)]
pub struct SignResponse {
    pub r: String,
    pub s2: String,
    pub s3: String,
}

/// POST /api/sign
pub async fn sign(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ClientIp(ip): ClientIp,
    payload: Result<Json<SignRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<SignResponse>>, ApiError> {
    let Json(req) = payload.map_err(|_| ApiError::InvalidParam)?;

    // A missing share is reported before the payload is examined.
    state.cosign.get_share(auth.user.id).await?;

    let q1 = decode_b64(&req.q1)?;
    let e = decode_digest(&req.e)?;

    let signature = state.cosign.sign(auth.user.id, &q1, &e, &ip).await?;

    Ok(ApiResponse::ok(SignResponse {
        r: b64(&signature.r),
        s2: b64(&signature.s2),
        s3: b64(&signature.s3),
    }))
}

#[derive(Debug, Deserialize)]
pub struct DecryptRequest {
    pub t1: String,
}

#[derive(Debug, Serialize)]
pub struct DecryptResponse {
    pub t2: String,
}

/// POST /api/decrypt
pub async fn decrypt(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ClientIp(ip): ClientIp,
    payload: Result<Json<DecryptRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<DecryptResponse>>, ApiError> {
    let Json(req) = payload.map_err(|_| ApiError::InvalidParam)?;

    // A missing share is reported before the payload is examined.
    state.cosign.get_share(auth.user.id).await?;

    let t1 = decode_b64(&req.t1)?;

    let t2 = state.cosign.decrypt(auth.user.id, &t1, &ip).await?;

    Ok(ApiResponse::ok(DecryptResponse { t2: b64(&t2) }))
}
