//! secp256k1 private key with scalar arithmetic.
//!
//! Wraps a k256 `SecretKey` and adds the operations the escrow needs on top
//! of plain key handling: modular addition/subtraction of scalars (for
//! additive secret splitting) and ECDH shared points.

use std::fmt;

use k256::elliptic_curve::ops::Reduce;
use k256::{NonZeroScalar, Scalar, SecretKey, U256};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use zeroize::Zeroizing;

use crate::ec::public_key::PublicKey;
use crate::PrimitivesError;

/// Length of a serialized private key in bytes.
pub const PRIVATE_KEY_BYTES_LEN: usize = 32;

/// A secp256k1 private key.
///
/// The scalar is always in `[1, n-1]`. The underlying `SecretKey` zeroizes
/// its memory on drop.
#[derive(Clone)]
pub struct PrivateKey {
    inner: SecretKey,
}

impl PrivateKey {
    /// Generate a new random private key from the operating system CSPRNG.
    ///
    /// Fails with `PrimitivesError::Randomness` if the OS generator cannot
    /// produce bytes; there is no fallback source.
    pub fn generate() -> Result<Self, PrimitivesError> {
        Self::generate_with(&mut OsRng)
    }

    /// Generate a new random private key from the given CSPRNG.
    ///
    /// Rejection-samples 32-byte candidates until one is a valid non-zero
    /// scalar below the curve order.
    pub fn generate_with<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self, PrimitivesError> {
        let mut candidate = Zeroizing::new([0u8; PRIVATE_KEY_BYTES_LEN]);
        loop {
            rng.try_fill_bytes(&mut candidate[..])
                .map_err(|e| PrimitivesError::Randomness(e.to_string()))?;
            if let Ok(inner) = SecretKey::from_slice(&candidate[..]) {
                return Ok(PrivateKey { inner });
            }
        }
    }

    /// Create a private key from a raw 32-byte big-endian scalar.
    ///
    /// # Returns
    /// `Ok(PrivateKey)` if the bytes encode a scalar in `[1, n-1]`, an error
    /// if the length is wrong, the scalar is zero or it is not below the order.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        if bytes.len() != PRIVATE_KEY_BYTES_LEN {
            return Err(PrimitivesError::InvalidKeyLength {
                expected: PRIVATE_KEY_BYTES_LEN,
                got: bytes.len(),
            });
        }
        let inner = SecretKey::from_slice(bytes).map_err(|_| {
            PrimitivesError::InvalidPrivateKey(
                "scalar is zero or not below the curve order".to_string(),
            )
        })?;
        Ok(PrivateKey { inner })
    }

    /// Create a private key from a hexadecimal string.
    pub fn from_hex(hex_str: &str) -> Result<Self, PrimitivesError> {
        if hex_str.is_empty() {
            return Err(PrimitivesError::InvalidPrivateKey(
                "private key hex is empty".to_string(),
            ));
        }
        let bytes = Zeroizing::new(hex::decode(hex_str)?);
        Self::from_bytes(&bytes)
    }

    /// Create a private key from 32 bytes interpreted modulo the curve order.
    ///
    /// Used for key material produced by hash functions, where the output is
    /// uniformly distributed over 256 bits rather than over `[1, n-1]`.
    pub fn from_bytes_mod_order(bytes: &[u8; PRIVATE_KEY_BYTES_LEN]) -> Result<Self, PrimitivesError> {
        let uint = U256::from_be_slice(bytes);
        Self::from_scalar(<Scalar as Reduce<U256>>::reduce(uint))
    }

    /// Serialize the private key as a 32-byte big-endian array.
    ///
    /// The returned buffer wipes itself when dropped.
    pub fn to_bytes(&self) -> Zeroizing<[u8; PRIVATE_KEY_BYTES_LEN]> {
        let mut out = Zeroizing::new([0u8; PRIVATE_KEY_BYTES_LEN]);
        out.copy_from_slice(&self.inner.to_bytes());
        out
    }

    /// Serialize the private key as a lowercase hexadecimal string.
    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(&self.to_bytes()[..]))
    }

    /// Derive the corresponding public key (`k·G`).
    pub fn pub_key(&self) -> PublicKey {
        PublicKey::from_k256(self.inner.public_key())
    }

    /// Compute the ECDH shared point with another public key.
    ///
    /// Multiplies the other party's point by this key's scalar.
    ///
    /// # Returns
    /// The shared point, or an error if the result is the point at infinity.
    pub fn derive_shared_secret(&self, pub_key: &PublicKey) -> Result<PublicKey, PrimitivesError> {
        let shared_point = pub_key.to_projective() * self.to_scalar();
        PublicKey::from_projective(shared_point)
    }

    /// Add two private keys modulo the curve order.
    ///
    /// Fails if the sum is zero, which is not a valid private key.
    pub fn add(&self, other: &PrivateKey) -> Result<PrivateKey, PrimitivesError> {
        Self::from_scalar(self.to_scalar() + other.to_scalar())
    }

    /// Subtract `other` from this key modulo the curve order.
    ///
    /// Fails if the difference is zero (the two keys are equal).
    pub fn sub(&self, other: &PrivateKey) -> Result<PrivateKey, PrimitivesError> {
        Self::from_scalar(self.to_scalar() - other.to_scalar())
    }

    fn from_scalar(scalar: Scalar) -> Result<Self, PrimitivesError> {
        let non_zero = Option::<NonZeroScalar>::from(NonZeroScalar::new(scalar)).ok_or_else(|| {
            PrimitivesError::InvalidPrivateKey("scalar is zero".to_string())
        })?;
        Ok(PrivateKey {
            inner: SecretKey::from(non_zero),
        })
    }

    pub(crate) fn to_scalar(&self) -> Scalar {
        *self.inner.to_nonzero_scalar().as_ref()
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl Eq for PrivateKey {}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("pub_key", &self.pub_key().to_hex())
            .finish_non_exhaustive()
    }
}
