use escrow_hpke::HpkeError;
use escrow_primitives::PrimitivesError;

/// Broad category of an [`EscrowError`].
///
/// Lets callers tell a malformed or tampered bundle apart from their own
/// misconfiguration without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed wire data: version, bearer, truncation, trailing bytes.
    Parse,
    /// Invalid point encoding or a point operation hitting infinity.
    Curve,
    /// Authentication failure or a broken randomness source.
    Crypto,
    /// A message decrypted fine but its content has the wrong shape.
    Integrity,
    /// The caller passed unusable parameters.
    Config,
}

/// Error types for escrow operations.
#[derive(Debug, thiserror::Error)]
pub enum EscrowError {
    #[error("unsupported recovery key bundle version: found v{found}, expected v{expected}")]
    UnsupportedVersion { found: u8, expected: u8 },

    #[error("unknown key bearer byte {0}")]
    UnknownBearer(u8),

    #[error("recovery key bundle is truncated: expected at least {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("recovery key bundle is longer than expected: {extra} trailing bytes")]
    TrailingBytes { extra: usize },

    #[error("invalid base64: {0}")]
    InvalidBase64(String),

    #[error("{0}")]
    Curve(#[from] PrimitivesError),

    /// Decryption or encryption of a half failed. `label` names the half.
    #[error("{label}: {source}")]
    Crypto {
        label: &'static str,
        #[source]
        source: HpkeError,
    },

    #[error("{label}: decrypted {actual} bytes, expected {expected}")]
    PlaintextLength {
        label: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("chain code must be {expected} bytes, got {actual}")]
    InvalidChainCode { expected: usize, actual: usize },

    #[error("invalid recovery code: {0}")]
    InvalidRecoveryCode(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl EscrowError {
    /// The category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EscrowError::UnsupportedVersion { .. }
            | EscrowError::UnknownBearer(_)
            | EscrowError::Truncated { .. }
            | EscrowError::TrailingBytes { .. }
            | EscrowError::InvalidBase64(_) => ErrorKind::Parse,
            EscrowError::Curve(PrimitivesError::Randomness(_)) => ErrorKind::Crypto,
            EscrowError::Curve(_) => ErrorKind::Curve,
            EscrowError::Crypto { source, .. } => match source {
                HpkeError::Primitives(PrimitivesError::Randomness(_)) => ErrorKind::Crypto,
                HpkeError::Primitives(_) => ErrorKind::Curve,
                _ => ErrorKind::Crypto,
            },
            EscrowError::PlaintextLength { .. } => ErrorKind::Integrity,
            EscrowError::InvalidChainCode { .. }
            | EscrowError::InvalidRecoveryCode(_)
            | EscrowError::InvalidConfig(_) => ErrorKind::Config,
        }
    }

    /// Wrap an HPKE failure with the label of the half it concerns.
    pub(crate) fn crypto(label: &'static str) -> impl FnOnce(HpkeError) -> EscrowError {
        move |source| EscrowError::Crypto { label, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(EscrowError::UnknownBearer(9).kind(), ErrorKind::Parse);
        assert_eq!(
            EscrowError::Curve(PrimitivesError::PointAtInfinity).kind(),
            ErrorKind::Curve
        );
        assert_eq!(
            EscrowError::crypto("half")(HpkeError::Authentication).kind(),
            ErrorKind::Crypto
        );
        assert_eq!(
            EscrowError::crypto("half")(HpkeError::Primitives(PrimitivesError::PointNotOnCurve))
                .kind(),
            ErrorKind::Curve
        );
        assert_eq!(
            EscrowError::InvalidChainCode { expected: 32, actual: 31 }.kind(),
            ErrorKind::Config
        );
    }

    #[test]
    fn test_version_message_names_both_versions() {
        let err = EscrowError::UnsupportedVersion { found: 2, expected: 3 };
        assert_eq!(
            err.to_string(),
            "unsupported recovery key bundle version: found v2, expected v3"
        );
    }
}
