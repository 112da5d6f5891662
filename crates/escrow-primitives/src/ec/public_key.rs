//! secp256k1 public key with point arithmetic.
//!
//! Supports compressed/uncompressed SEC1 serialization, point addition,
//! negation and subtraction. Subtraction is how the escrow recovers the
//! public share held by the other party: `other = total - mine`.

use std::fmt;

use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::ProjectivePoint;

use crate::PrimitivesError;

/// Length of a compressed public key in bytes (prefix + 32 byte x-coordinate).
pub const COMPRESSED_LEN: usize = 33;

/// Length of an uncompressed public key in bytes (prefix + 32 byte x + 32 byte y).
pub const UNCOMPRESSED_LEN: usize = 65;

/// A secp256k1 public key: a point on the curve other than infinity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PublicKey {
    inner: k256::PublicKey,
}

impl PublicKey {
    /// Create a PublicKey from raw SEC1 encoded bytes.
    ///
    /// Accepts both compressed (33-byte) and uncompressed (65-byte) formats.
    /// Off-curve points and the identity encoding are rejected.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        if bytes.is_empty() {
            return Err(PrimitivesError::InvalidPublicKey(
                "pubkey bytes are empty".to_string(),
            ));
        }
        let inner = k256::PublicKey::from_sec1_bytes(bytes).map_err(|_| {
            PrimitivesError::InvalidPublicKey(format!(
                "{} bytes do not encode a point on secp256k1",
                bytes.len()
            ))
        })?;
        Ok(PublicKey { inner })
    }

    /// Create a PublicKey from a hex-encoded SEC1 string.
    pub fn from_hex(hex_str: &str) -> Result<Self, PrimitivesError> {
        let bytes = hex::decode(hex_str)?;
        Self::from_bytes(&bytes)
    }

    /// Serialize the public key in compressed SEC1 format (33 bytes).
    pub fn to_compressed(&self) -> [u8; COMPRESSED_LEN] {
        let point = self.inner.to_encoded_point(true);
        let mut out = [0u8; COMPRESSED_LEN];
        out.copy_from_slice(point.as_bytes());
        out
    }

    /// Serialize the public key in uncompressed SEC1 format (65 bytes).
    ///
    /// The first byte is 0x04, followed by 32-byte X and 32-byte Y coordinates.
    pub fn to_uncompressed(&self) -> [u8; UNCOMPRESSED_LEN] {
        let point = self.inner.to_encoded_point(false);
        let mut out = [0u8; UNCOMPRESSED_LEN];
        out.copy_from_slice(point.as_bytes());
        out
    }

    /// The 32-byte big-endian X coordinate.
    pub fn x_coordinate(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        out.copy_from_slice(&self.to_compressed()[1..]);
        out
    }

    /// Serialize the public key as a lowercase hex string (compressed format).
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_compressed())
    }

    /// Point addition `self + other`.
    ///
    /// Fails with `PointAtInfinity` when `other` is the negation of `self`.
    pub fn add(&self, other: &PublicKey) -> Result<PublicKey, PrimitivesError> {
        Self::from_projective(self.to_projective() + other.to_projective())
    }

    /// Point negation: same X, Y replaced by `p - Y`.
    pub fn negate(&self) -> Result<PublicKey, PrimitivesError> {
        Self::from_projective(-self.to_projective())
    }

    /// Point subtraction `self - other`, computed as `self + (-other)`.
    ///
    /// Negation is only an involution without fixed points when the
    /// subtrahend's Y coordinate is non-zero. secp256k1 has prime order so no
    /// such point exists, but the condition is checked rather than assumed.
    pub fn sub(&self, other: &PublicKey) -> Result<PublicKey, PrimitivesError> {
        if other.has_zero_y() {
            return Err(PrimitivesError::InvalidPublicKey(
                "subtrahend has a zero Y coordinate".to_string(),
            ));
        }
        self.add(&other.negate()?)
    }

    /// Whether the affine Y coordinate of this point is zero.
    pub fn has_zero_y(&self) -> bool {
        let encoded = self.inner.to_encoded_point(false);
        encoded
            .y()
            .map_or(true, |y| y.iter().all(|byte| *byte == 0))
    }

    pub(crate) fn from_k256(inner: k256::PublicKey) -> Self {
        PublicKey { inner }
    }

    pub(crate) fn from_projective(point: ProjectivePoint) -> Result<Self, PrimitivesError> {
        let inner = k256::PublicKey::from_affine(point.to_affine())
            .map_err(|_| PrimitivesError::PointAtInfinity)?;
        Ok(PublicKey { inner })
    }

    pub(crate) fn to_projective(&self) -> ProjectivePoint {
        self.inner.to_projective()
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
