//! Server half of the two-party SM2 cooperative protocol.
//!
//! The signing private key never exists in one place: the client holds a
//! secret scalar `d1`, the server holds `d2`, and the joint public key is
//! `Pa = (d1·d2)⁻¹·G − G`. Key generation publishes with `d2⁻¹`, the
//! signing half multiplies with `d2`, and the decryption half multiplies
//! with `d2⁻¹`; the two stored scalars must remain mutual inverses mod `n`
//! for signatures to assemble correctly on the client.
//!
//! All three routines are pure in their inputs plus the supplied CSPRNG;
//! they hold no state and touch no storage.

use elliptic_curve::ops::MulByGenerator;
use elliptic_curve::sec1::ToEncodedPoint;
use elliptic_curve::Field;
use rand::{CryptoRng, RngCore};
use sm2::ProjectivePoint;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::constants::{POINT_SIZE, SCALAR_SIZE};
use crate::curve;
use crate::errors::{CryptoError, Result};

/// Degenerate draws (`r = 0`, `r + k2 = 0`, `X1 = ∞`) each occur with
/// probability ~2⁻²⁵⁶; hitting the cap means the RNG is broken.
const SIGN_ATTEMPTS: usize = 16;

/// Result of cooperative key generation.
///
/// `d2` and `d2_inv` are secret and zeroized on drop; `p2` goes back to
/// the client and `pa` is the publishable joint public key.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct CoopKeyPair {
    /// Server secret share.
    pub d2: [u8; SCALAR_SIZE],
    /// Cached `d2⁻¹ mod n`.
    pub d2_inv: [u8; SCALAR_SIZE],
    /// Server public component `d2⁻¹·G`.
    #[zeroize(skip)]
    pub p2: [u8; POINT_SIZE],
    /// Joint public key `d2⁻¹·P1 − G`.
    #[zeroize(skip)]
    pub pa: [u8; POINT_SIZE],
}

/// Server contribution to a cooperative signature.
pub struct CoopSignature {
    /// First signature component `(e + x1) mod n`.
    pub r: [u8; SCALAR_SIZE],
    /// Partial component `d2·k3 mod n`.
    pub s2: [u8; SCALAR_SIZE],
    /// Partial component `d2·(r + k2) mod n`.
    pub s3: [u8; SCALAR_SIZE],
}

/// Cooperative key generation, server side.
///
/// `p1` is the client's 64-byte public component `d1⁻¹·G`. Draws a fresh
/// `d2`, caches its inverse, and derives `P2 = d2⁻¹·G` and
/// `Pa = d2⁻¹·P1 − G`.
pub fn keygen_init(p1: &[u8], rng: &mut (impl RngCore + CryptoRng)) -> Result<CoopKeyPair> {
    let p1 = curve::decode_point(p1)?;

    let d2 = curve::random_scalar(rng)?;
    let d2_inv = curve::invert_scalar(&d2)?;

    let p2 = ProjectivePoint::mul_by_generator(&d2_inv).to_affine();
    let pa = (ProjectivePoint::from(p1) * d2_inv - ProjectivePoint::GENERATOR).to_affine();

    Ok(CoopKeyPair {
        d2: curve::scalar_to_bytes(&d2),
        d2_inv: curve::scalar_to_bytes(&d2_inv),
        p2: curve::encode_point(&p2)?,
        pa: curve::encode_point(&pa)?,
    })
}

/// Cooperative signing, server side.
///
/// `d2` is the stored server share, `q1` the client's 64-byte nonce point
/// `k1·G`, and `e` the 32-byte message digest interpreted as a big-endian
/// integer in `[0, n)`. The client completes the signature as
/// `s = (d1·(k1·s2 + s3) − r) mod n`.
pub fn sign(
    d2: &[u8; SCALAR_SIZE],
    q1: &[u8],
    e: &[u8; SCALAR_SIZE],
    rng: &mut (impl RngCore + CryptoRng),
) -> Result<CoopSignature> {
    let q1 = ProjectivePoint::from(curve::decode_point(q1)?);
    let e = curve::scalar_from_bytes(e)?;
    let d2 = curve::secret_scalar_from_bytes(d2)?;

    for _ in 0..SIGN_ATTEMPTS {
        let k2 = curve::random_scalar(rng)?;
        let k3 = curve::random_scalar(rng)?;

        // X1 = k3·Q1 + k2·G
        let x1_point = (q1 * k3 + ProjectivePoint::mul_by_generator(&k2)).to_affine();
        let encoded = x1_point.to_encoded_point(false);
        let x1 = match encoded.x() {
            Some(x1) => {
                let x1: [u8; SCALAR_SIZE] = (*x1).into();
                curve::reduce_to_scalar(&x1)
            }
            // k1·k3 + k2 ≡ 0 (mod n): the nonce point degenerated.
            None => continue,
        };

        let r = e + x1;
        let r_plus_k2 = r + k2;
        if bool::from(r.is_zero()) || bool::from(r_plus_k2.is_zero()) {
            continue;
        }

        let s2 = d2 * k3;
        let s3 = d2 * r_plus_k2;

        return Ok(CoopSignature {
            r: curve::scalar_to_bytes(&r),
            s2: curve::scalar_to_bytes(&s2),
            s3: curve::scalar_to_bytes(&s3),
        });
    }

    Err(CryptoError::RetriesExhausted)
}

/// Cooperative decryption, server side.
///
/// `t1` is the client's first transform `d1⁻¹·C1` of the ciphertext's
/// ephemeral point; the server contributes `T2 = d2⁻¹·T1` and never sees
/// the plaintext.
pub fn decrypt(d2_inv: &[u8; SCALAR_SIZE], t1: &[u8]) -> Result<[u8; POINT_SIZE]> {
    let t1 = ProjectivePoint::from(curve::decode_point(t1)?);
    let d2_inv = curve::secret_scalar_from_bytes(d2_inv)?;

    let t2 = (t1 * d2_inv).to_affine();
    curve::encode_point(&t2)
}
