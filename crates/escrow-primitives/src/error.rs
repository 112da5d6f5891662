/// Unified error type for all primitives operations.
///
/// Covers key parsing, point/scalar arithmetic, encoding and extended-key
/// serialization. Messages carry lengths and encodings, never key bytes.
#[derive(Debug, thiserror::Error)]
pub enum PrimitivesError {
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("point not on curve")]
    PointNotOnCurve,

    #[error("point at infinity")]
    PointAtInfinity,

    #[error("invalid key length: expected {expected}, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },

    #[error("invalid chain code: expected 32 bytes, got {0}")]
    InvalidChainCode(usize),

    #[error("invalid extended key: {0}")]
    InvalidExtendedKey(String),

    #[error("checksum mismatch")]
    ChecksumMismatch,

    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("invalid base58: {0}")]
    InvalidBase58(String),

    #[error("randomness source failed: {0}")]
    Randomness(String),
}

impl From<hex::FromHexError> for PrimitivesError {
    fn from(e: hex::FromHexError) -> Self {
        PrimitivesError::InvalidHex(e.to_string())
    }
}
