//! Thin wrapper around the SM2 curve arithmetic.
//!
//! Points travel as 64-byte uncompressed `X ‖ Y` encodings (big-endian,
//! no SEC1 `0x04` prefix); scalars as 32-byte big-endian integers. All
//! operations that touch secret scalars go through the constant-time
//! implementations of the `sm2` crate.

use elliptic_curve::{
    ops::{MulByGenerator, Reduce},
    sec1::{FromEncodedPoint, ToEncodedPoint},
    Field, PrimeField,
};
use rand::{CryptoRng, RngCore};
pub use sm2::{AffinePoint, ProjectivePoint, Scalar};
use sm2::{EncodedPoint, FieldBytes, U256};

use crate::constants::{POINT_SIZE, SCALAR_SIZE};
use crate::errors::{CryptoError, Result};

/// Rejection-sampling budget for [`random_scalar`]. A draw lands outside
/// `[1, n-1]` with probability < 2⁻³², so more than a couple of rounds
/// already indicates a broken entropy source.
const RANDOM_SCALAR_ATTEMPTS: usize = 16;

/// Decode a 64-byte `X ‖ Y` encoding into an affine point.
///
/// Fails with [`CryptoError::InvalidPoint`] when the coordinates are not
/// on the curve (which also rules out the point at infinity, since the
/// curve has a non-zero `b`).
pub fn decode_point(bytes: &[u8]) -> Result<AffinePoint> {
    if bytes.len() != POINT_SIZE {
        return Err(CryptoError::InvalidLength {
            expected: POINT_SIZE,
            actual: bytes.len(),
        });
    }

    let encoded = EncodedPoint::from_affine_coordinates(
        FieldBytes::from_slice(&bytes[..SCALAR_SIZE]),
        FieldBytes::from_slice(&bytes[SCALAR_SIZE..]),
        false,
    );

    Option::<AffinePoint>::from(AffinePoint::from_encoded_point(&encoded))
        .ok_or(CryptoError::InvalidPoint)
}

/// Encode an affine point as 64 bytes of `X ‖ Y`, each coordinate
/// left-padded to 32 bytes.
pub fn encode_point(point: &AffinePoint) -> Result<[u8; POINT_SIZE]> {
    let encoded = point.to_encoded_point(false);
    let (x, y) = match (encoded.x(), encoded.y()) {
        (Some(x), Some(y)) => (x, y),
        // The identity has no affine coordinates.
        _ => return Err(CryptoError::InvalidPoint),
    };

    let mut out = [0u8; POINT_SIZE];
    out[..SCALAR_SIZE].copy_from_slice(x);
    out[SCALAR_SIZE..].copy_from_slice(y);
    Ok(out)
}

/// Draw a uniform scalar in `[1, n-1]` by rejection sampling from `rng`.
pub fn random_scalar(rng: &mut (impl RngCore + CryptoRng)) -> Result<Scalar> {
    for _ in 0..RANDOM_SCALAR_ATTEMPTS {
        let mut buf = FieldBytes::default();
        rng.try_fill_bytes(&mut buf)
            .map_err(|e| CryptoError::RandomGenerationFailed(e.to_string()))?;

        if let Some(scalar) = Option::<Scalar>::from(Scalar::from_repr(buf)) {
            if !bool::from(scalar.is_zero()) {
                return Ok(scalar);
            }
        }
    }
    Err(CryptoError::RetriesExhausted)
}

/// Invert a scalar modulo the group order `n`.
///
/// For a prime `n` the inverse exists for every non-zero scalar, but the
/// result is still checked.
pub fn invert_scalar(scalar: &Scalar) -> Result<Scalar> {
    Option::<Scalar>::from(scalar.invert()).ok_or(CryptoError::InversionFailed)
}

/// Parse a caller-supplied 32-byte big-endian scalar in `[0, n)`.
pub fn scalar_from_bytes(bytes: &[u8; SCALAR_SIZE]) -> Result<Scalar> {
    Option::<Scalar>::from(Scalar::from_repr(FieldBytes::from(*bytes)))
        .ok_or(CryptoError::InvalidScalar)
}

/// Parse a stored secret scalar, requiring `0 < s < n`.
///
/// Anything else means the persisted share material is corrupt.
pub fn secret_scalar_from_bytes(bytes: &[u8; SCALAR_SIZE]) -> Result<Scalar> {
    let scalar = Option::<Scalar>::from(Scalar::from_repr(FieldBytes::from(*bytes)))
        .ok_or(CryptoError::InvalidSecretScalar)?;
    if bool::from(scalar.is_zero()) {
        return Err(CryptoError::InvalidSecretScalar);
    }
    Ok(scalar)
}

/// Serialize a scalar as exactly 32 big-endian bytes.
pub fn scalar_to_bytes(scalar: &Scalar) -> [u8; SCALAR_SIZE] {
    scalar.to_repr().into()
}

/// Interpret a 32-byte field element (an affine x-coordinate) as a scalar
/// modulo `n`.
pub fn reduce_to_scalar(bytes: &[u8; SCALAR_SIZE]) -> Scalar {
    <Scalar as Reduce<U256>>::reduce_bytes(&FieldBytes::from(*bytes))
}

/// `k·G` on the base point.
pub fn scalar_base_mul(k: &Scalar) -> AffinePoint {
    ProjectivePoint::mul_by_generator(k).to_affine()
}

/// `k·P` on an arbitrary point.
pub fn scalar_mul(point: &AffinePoint, k: &Scalar) -> AffinePoint {
    (ProjectivePoint::from(*point) * k).to_affine()
}

/// `P + Q`.
pub fn point_add(p: &AffinePoint, q: &AffinePoint) -> AffinePoint {
    (ProjectivePoint::from(*p) + ProjectivePoint::from(*q)).to_affine()
}
