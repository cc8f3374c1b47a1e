//! At-rest wrapping of share secrets using XChaCha20-Poly1305.
//!
//! A wrapped blob is `nonce(24) ‖ ciphertext ‖ tag(16)`. The AAD binds the
//! blob to its owning user and a domain label, so a blob lifted from one
//! row cannot be replayed into another.

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    XChaCha20Poly1305, XNonce,
};
use rand::{CryptoRng, RngCore};
use uuid::Uuid;

use crate::constants::{DOMAIN_SHARE_WRAP, MASTER_KEY_SIZE, NONCE_SIZE, SCALAR_SIZE, TAG_SIZE};
use crate::errors::{CryptoError, Result};

fn share_aad(user_id: &Uuid) -> Vec<u8> {
    let mut aad = Vec::with_capacity(DOMAIN_SHARE_WRAP.len() + 16);
    aad.extend_from_slice(DOMAIN_SHARE_WRAP);
    aad.extend_from_slice(user_id.as_bytes());
    aad
}

/// Encrypt data using XChaCha20-Poly1305 AEAD.
pub fn encrypt(
    key: &[u8; MASTER_KEY_SIZE],
    plaintext: &[u8],
    nonce: &[u8; NONCE_SIZE],
    aad: &[u8],
) -> Result<Vec<u8>> {
    let cipher = XChaCha20Poly1305::new(key.into());
    cipher
        .encrypt(
            XNonce::from_slice(nonce),
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))
}

/// Decrypt data using XChaCha20-Poly1305 AEAD.
pub fn decrypt(
    key: &[u8; MASTER_KEY_SIZE],
    ciphertext: &[u8],
    nonce: &[u8; NONCE_SIZE],
    aad: &[u8],
) -> Result<Vec<u8>> {
    let cipher = XChaCha20Poly1305::new(key.into());
    cipher
        .decrypt(
            XNonce::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))
}

/// Wrap one share secret for persistence.
///
/// A fresh random nonce is drawn per call and prepended to the ciphertext.
pub fn wrap_share_secret(
    master_key: &[u8; MASTER_KEY_SIZE],
    secret: &[u8; SCALAR_SIZE],
    user_id: &Uuid,
    rng: &mut (impl RngCore + CryptoRng),
) -> Result<Vec<u8>> {
    let mut nonce = [0u8; NONCE_SIZE];
    rng.try_fill_bytes(&mut nonce)
        .map_err(|e| CryptoError::RandomGenerationFailed(e.to_string()))?;

    let ciphertext = encrypt(master_key, secret, &nonce, &share_aad(user_id))?;

    let mut blob = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&ciphertext);
    Ok(blob)
}

/// Unwrap a persisted share secret.
///
/// Fails when the blob is truncated, was wrapped for a different user, or
/// fails authentication under `master_key`.
pub fn unwrap_share_secret(
    master_key: &[u8; MASTER_KEY_SIZE],
    blob: &[u8],
    user_id: &Uuid,
) -> Result<[u8; SCALAR_SIZE]> {
    if blob.len() != NONCE_SIZE + SCALAR_SIZE + TAG_SIZE {
        return Err(CryptoError::DecryptionFailed("truncated blob".into()));
    }

    let mut nonce = [0u8; NONCE_SIZE];
    nonce.copy_from_slice(&blob[..NONCE_SIZE]);
    let plaintext = decrypt(master_key, &blob[NONCE_SIZE..], &nonce, &share_aad(user_id))?;

    plaintext
        .try_into()
        .map_err(|_| CryptoError::DecryptionFailed("unexpected secret length".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn wrap_unwrap_round_trip() {
        let master_key = [7u8; 32];
        let secret = [42u8; 32];
        let user_id = Uuid::new_v4();

        let blob = wrap_share_secret(&master_key, &secret, &user_id, &mut OsRng).unwrap();
        assert_eq!(blob.len(), NONCE_SIZE + SCALAR_SIZE + TAG_SIZE);

        let unwrapped = unwrap_share_secret(&master_key, &blob, &user_id).unwrap();
        assert_eq!(unwrapped, secret);
    }

    #[test]
    fn unwrap_with_wrong_key_fails() {
        let secret = [42u8; 32];
        let user_id = Uuid::new_v4();

        let blob = wrap_share_secret(&[7u8; 32], &secret, &user_id, &mut OsRng).unwrap();
        assert!(unwrap_share_secret(&[8u8; 32], &blob, &user_id).is_err());
    }

    #[test]
    fn unwrap_for_wrong_user_fails() {
        let master_key = [7u8; 32];
        let secret = [42u8; 32];

        let blob = wrap_share_secret(&master_key, &secret, &Uuid::new_v4(), &mut OsRng).unwrap();
        assert!(unwrap_share_secret(&master_key, &blob, &Uuid::new_v4()).is_err());
    }

    #[test]
    fn unwrap_rejects_truncated_blob() {
        let master_key = [7u8; 32];
        let blob = wrap_share_secret(&master_key, &[1u8; 32], &Uuid::new_v4(), &mut OsRng).unwrap();
        assert!(unwrap_share_secret(&master_key, &blob[..blob.len() - 1], &Uuid::new_v4()).is_err());
    }

    #[test]
    fn wrapping_twice_yields_distinct_blobs() {
        let master_key = [7u8; 32];
        let secret = [42u8; 32];
        let user_id = Uuid::new_v4();

        let a = wrap_share_secret(&master_key, &secret, &user_id, &mut OsRng).unwrap();
        let b = wrap_share_secret(&master_key, &secret, &user_id, &mut OsRng).unwrap();
        assert_ne!(a, b);
    }
}
