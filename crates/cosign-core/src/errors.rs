//! Service error types.
//!
//! Failures carry structured context internally; the HTTP layer projects
//! them onto the numeric business codes of the external contract.

use cosign_crypto::CryptoError;
use cosign_storage::StorageError;
use thiserror::Error;

/// Domain-level operation errors
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed or out-of-range request input
    #[error("invalid parameter")]
    InvalidParam,

    /// Username already registered
    #[error("username already exists")]
    UserExists,

    /// No such user
    #[error("user not found")]
    UserNotFound,

    /// Password verification failed
    #[error("incorrect password")]
    PasswordError,

    /// Bearer token unknown
    #[error("invalid token")]
    TokenInvalid,

    /// Bearer token past its expiry
    #[error("token expired")]
    TokenExpired,

    /// Owning user is disabled
    #[error("user disabled")]
    UserDisabled,

    /// User has no key share
    #[error("key not found")]
    KeyNotFound,

    /// A share already exists for the user
    #[error("share already exists")]
    Conflict,

    /// Cryptographic computation failed
    #[error("cryptographic failure: {0}")]
    Crypto(#[source] CryptoError),

    /// Persistence failure
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Invariant break, CSPRNG failure, or corrupt stored material
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<CryptoError> for ServiceError {
    fn from(e: CryptoError) -> Self {
        match e {
            // Caller-supplied bytes that fail validation.
            CryptoError::InvalidPoint
            | CryptoError::InvalidScalar
            | CryptoError::InvalidLength { .. } => ServiceError::InvalidParam,
            // Stored material or the environment is broken; never the caller.
            CryptoError::InvalidSecretScalar => {
                ServiceError::Internal("share material corrupt".into())
            }
            CryptoError::DecryptionFailed(_) => ServiceError::Internal("share unwrap failed".into()),
            CryptoError::EncryptionFailed(_) => ServiceError::Internal("share wrap failed".into()),
            CryptoError::InvalidVerifierFormat => {
                ServiceError::Internal("stored password verifier malformed".into())
            }
            CryptoError::RandomGenerationFailed(_) | CryptoError::RetriesExhausted => {
                ServiceError::Internal(e.to_string())
            }
            other => ServiceError::Crypto(other),
        }
    }
}

/// Result type for domain operations
pub type Result<T> = std::result::Result<T, ServiceError>;
