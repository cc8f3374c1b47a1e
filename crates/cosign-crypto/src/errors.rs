//! Cryptographic error types.

use thiserror::Error;

/// Cryptographic operation errors
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Input bytes do not encode a point on the curve
    #[error("invalid curve point encoding")]
    InvalidPoint,

    /// Caller-supplied scalar is not in `[0, n)`
    #[error("scalar out of range")]
    InvalidScalar,

    /// A stored secret scalar failed validation on load
    #[error("secret scalar out of range")]
    InvalidSecretScalar,

    /// Invalid input length
    #[error("invalid length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Expected length in bytes
        expected: usize,
        /// Actual length in bytes
        actual: usize,
    },

    /// The system CSPRNG returned an error
    #[error("random generation failed: {0}")]
    RandomGenerationFailed(String),

    /// Modular inversion does not exist for the given scalar
    #[error("scalar inversion failed")]
    InversionFailed,

    /// Degenerate random draws exhausted the retry budget
    #[error("degenerate randomness, retries exhausted")]
    RetriesExhausted,

    /// AEAD encryption failed
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    /// AEAD decryption / authentication failed
    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    /// Stored password verifier is malformed
    #[error("invalid verifier format")]
    InvalidVerifierFormat,
}

/// Result type for cryptographic operations
pub type Result<T> = std::result::Result<T, CryptoError>;
