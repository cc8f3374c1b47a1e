//! Shared helpers: timestamps and random identifiers.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::{CryptoRng, RngCore};

use crate::constants::{SALT_SIZE, TOKEN_SIZE};
use crate::errors::{CryptoError, Result};

/// Current Unix timestamp in seconds.
///
/// # Panics
///
/// Panics if the system clock is set before the Unix epoch.
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time is before Unix epoch")
        .as_secs()
}

/// Generate an opaque bearer token: 32 CSPRNG bytes, hex-encoded.
pub fn generate_token(rng: &mut (impl RngCore + CryptoRng)) -> Result<String> {
    let mut bytes = [0u8; TOKEN_SIZE];
    rng.try_fill_bytes(&mut bytes)
        .map_err(|e| CryptoError::RandomGenerationFailed(e.to_string()))?;
    Ok(hex::encode(bytes))
}

/// Generate a fresh password salt.
pub fn generate_salt(rng: &mut (impl RngCore + CryptoRng)) -> Result<[u8; SALT_SIZE]> {
    let mut salt = [0u8; SALT_SIZE];
    rng.try_fill_bytes(&mut salt)
        .map_err(|e| CryptoError::RandomGenerationFailed(e.to_string()))?;
    Ok(salt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn timestamps_are_monotonic_enough() {
        let a = current_timestamp();
        let b = current_timestamp();
        assert!(b >= a);
        assert!(a > 1_600_000_000);
    }

    #[test]
    fn tokens_are_64_hex_chars_and_unique() {
        let a = generate_token(&mut OsRng).unwrap();
        let b = generate_token(&mut OsRng).unwrap();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
