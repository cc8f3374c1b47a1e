//! # cosign-crypto
//!
//! Cryptographic primitives for the two-party SM2 cooperative signing
//! service.
//!
//! This crate provides the curve arithmetic wrapper, the cooperative
//! protocol engine (key generation, signing, decryption halves), the SM3
//! password verifier, and the AEAD wrapping used for share material at
//! rest.
//!
//! ## Security Properties
//!
//! - Secret scalars are handled through constant-time curve operations
//! - Secret material is zeroized after use
//! - No unsafe code

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod constants;
pub mod curve;
pub mod encryption;
pub mod errors;
pub mod hashing;
pub mod protocol;
pub mod utils;

pub use constants::*;
pub use encryption::{unwrap_share_secret, wrap_share_secret};
pub use errors::CryptoError;
pub use hashing::{make_password_verifier, sm3_digest, verify_password};
pub use protocol::{CoopKeyPair, CoopSignature};
pub use utils::{current_timestamp, generate_salt, generate_token};
