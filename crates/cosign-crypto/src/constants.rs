//! Sizes and domain-separation labels.

/// Uncompressed affine point encoding: X ‖ Y, 32 bytes each, no prefix.
pub const POINT_SIZE: usize = 64;

/// Big-endian scalar encoding.
pub const SCALAR_SIZE: usize = 32;

/// Salt length for password verifiers.
pub const SALT_SIZE: usize = 16;

/// Raw length of a session token before hex encoding.
pub const TOKEN_SIZE: usize = 32;

/// Master key length for share wrapping.
pub const MASTER_KEY_SIZE: usize = 32;

/// XChaCha20-Poly1305 nonce length.
pub const NONCE_SIZE: usize = 24;

/// Poly1305 authentication tag length.
pub const TAG_SIZE: usize = 16;

/// Domain label bound into the AAD of wrapped share secrets.
pub const DOMAIN_SHARE_WRAP: &[u8] = b"cosign:share-wrap:v1";
