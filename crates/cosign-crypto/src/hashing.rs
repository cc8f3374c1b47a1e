//! SM3 hashing and the salted password verifier.

use sm3::{Digest, Sm3};
use subtle::ConstantTimeEq;

use crate::constants::SALT_SIZE;
use crate::errors::{CryptoError, Result};

/// Hex length of `hex(salt) ‖ hex(SM3(salt ‖ password))`.
const VERIFIER_LEN: usize = SALT_SIZE * 2 + 64;

/// SM3 digest of `data`.
pub fn sm3_digest(data: &[u8]) -> [u8; 32] {
    Sm3::digest(data).into()
}

/// Salted password hash: `SM3(salt ‖ password)`.
fn hash_password(password: &[u8], salt: &[u8; SALT_SIZE]) -> [u8; 32] {
    let mut hasher = Sm3::new();
    hasher.update(salt);
    hasher.update(password);
    hasher.finalize().into()
}

/// Build the stored verifier string `hex(salt) ‖ hex(SM3(salt ‖ password))`.
pub fn make_password_verifier(password: &[u8], salt: &[u8; SALT_SIZE]) -> String {
    let mut verifier = hex::encode(salt);
    verifier.push_str(&hex::encode(hash_password(password, salt)));
    verifier
}

/// Check `password` against a stored verifier in constant time.
///
/// Returns `Ok(false)` on mismatch; errs only when the stored verifier is
/// malformed.
pub fn verify_password(password: &[u8], verifier: &str) -> Result<bool> {
    if verifier.len() != VERIFIER_LEN {
        return Err(CryptoError::InvalidVerifierFormat);
    }

    let salt: [u8; SALT_SIZE] = hex::decode(&verifier[..SALT_SIZE * 2])
        .map_err(|_| CryptoError::InvalidVerifierFormat)?
        .try_into()
        .map_err(|_| CryptoError::InvalidVerifierFormat)?;
    let expected =
        hex::decode(&verifier[SALT_SIZE * 2..]).map_err(|_| CryptoError::InvalidVerifierFormat)?;

    let actual = hash_password(password, &salt);
    Ok(actual.ct_eq(expected.as_slice()).into())
}
