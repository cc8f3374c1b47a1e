//! Response envelope and business-code projection.
//!
//! Every response is HTTP 200 with `{code, message, data?}`; failures
//! carry a non-zero code. The numeric codes are the external contract and
//! are produced only here.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cosign_core::ServiceError;
use serde::Serialize;

/// Uniform response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub code: u32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Success envelope with payload.
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            code: 0,
            message: "success".to_string(),
            data: Some(data),
        })
    }
}

impl ApiResponse<()> {
    /// Success envelope without payload.
    pub fn empty() -> Json<Self> {
        Json(Self {
            code: 0,
            message: "success".to_string(),
            data: None,
        })
    }
}

/// Request failure, projected to a business code at response time.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed request body or parameter.
    InvalidParam,
    /// Missing or unparseable credentials.
    Unauthorized,
    /// Authenticated but not allowed.
    Forbidden,
    /// Domain failure from the service layer.
    Service(ServiceError),
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        ApiError::Service(e)
    }
}

impl ApiError {
    fn code_and_message(&self) -> (u32, &'static str) {
        match self {
            ApiError::InvalidParam => (10001, "invalid parameter"),
            ApiError::Unauthorized => (10012, "unauthorized"),
            ApiError::Forbidden => (10013, "forbidden"),
            ApiError::Service(e) => match e {
                ServiceError::InvalidParam => (10001, "invalid parameter"),
                ServiceError::UserExists => (10002, "username already exists"),
                ServiceError::UserNotFound => (10003, "user not found"),
                ServiceError::PasswordError => (10004, "incorrect password"),
                ServiceError::TokenInvalid => (10005, "invalid token"),
                ServiceError::TokenExpired => (10006, "token expired"),
                ServiceError::UserDisabled => (10007, "user disabled"),
                ServiceError::KeyNotFound => (10008, "key not found"),
                ServiceError::Crypto(_) => (10009, "crypto error"),
                ServiceError::Storage(_) => (10010, "database error"),
                ServiceError::Conflict | ServiceError::Internal(_) => (10011, "internal error"),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Service(e) = &self {
            match e {
                ServiceError::Crypto(_) | ServiceError::Storage(_) | ServiceError::Internal(_) => {
                    tracing::error!(error = %e, "request failed");
                }
                _ => {}
            }
        }

        let (code, message) = self.code_and_message();
        let body = Json(ApiResponse::<()> {
            code,
            message: message.to_string(),
            data: None,
        });
        (StatusCode::OK, body).into_response()
    }
}
