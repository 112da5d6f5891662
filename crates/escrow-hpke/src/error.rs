/// Error types for hybrid encryption operations.
#[derive(Debug, thiserror::Error)]
pub enum HpkeError {
    /// Curve-level failure: bad point encoding, off-curve point, infinity,
    /// or an unusable random source.
    #[error("{0}")]
    Primitives(#[from] escrow_primitives::PrimitivesError),

    #[error("message too short: expected at least {expected} bytes, got {actual} bytes")]
    MessageTooShort { expected: usize, actual: usize },

    #[error("message length mismatch: expected {expected} bytes, got {actual} bytes")]
    LengthMismatch { expected: usize, actual: usize },

    /// The AEAD tag did not verify. Wrong key, wrong info, wrong associated
    /// data and tampered bytes are indistinguishable.
    #[error("authentication failed: message was tampered with or key/info/aad do not match")]
    Authentication,

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),
}
