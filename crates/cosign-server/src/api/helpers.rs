//! Wire-format helpers: base64 byte strings, scalar normalization,
//! timestamp formatting.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};

use crate::error::ApiError;

/// Standard padded base64 of arbitrary bytes.
pub fn b64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode a base64 byte string; malformed input is a parameter error.
pub fn decode_b64(value: &str) -> Result<Vec<u8>, ApiError> {
    STANDARD.decode(value).map_err(|_| ApiError::InvalidParam)
}

/// Decode a base64 message digest, which must be exactly 32 bytes.
pub fn decode_digest(value: &str) -> Result<[u8; 32], ApiError> {
    decode_b64(value)?
        .try_into()
        .map_err(|_| ApiError::InvalidParam)
}

/// RFC 3339 rendering of a Unix timestamp.
pub fn rfc3339(timestamp: u64) -> String {
    DateTime::<Utc>::from_timestamp(timestamp as i64, 0)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_default()
}
