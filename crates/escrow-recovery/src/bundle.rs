//! The versioned recovery-key bundle and its wire format.
//!
//! Layout (then base64, standard alphabet with padding):
//!
//! `version (1) ‖ bearer (1) ‖ first message (65 + 64 + 16) ‖ second message (65 + 32 + 16)`
//!
//! The two messages carry no length prefix; their plaintext sizes are fixed
//! protocol constants.

use std::fmt;

use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::debug;

use escrow_hpke::EncryptedMessage;

use crate::labels::{
    MUUN_FIRST_HALF_TO_RECOVERY_CODE, MUUN_SECOND_HALF_TO_RECOVERY_CODE,
    USER_FIRST_HALF_TO_RECOVERY_CODE, USER_SECOND_HALF_TO_RECOVERY_CODE,
};
use crate::EscrowError;

/// The only bundle version this crate reads and writes.
pub const BUNDLE_VERSION: u8 = 3;

/// Plaintext length of the first message: scalar half ‖ chain code.
pub const FIRST_HALF_PLAINTEXT_LEN: usize = 64;

/// Plaintext length of the second message: scalar half.
pub const SECOND_HALF_PLAINTEXT_LEN: usize = 32;

/// Serialized length of a bundle before base64 encoding.
pub const BUNDLE_LEN: usize = 2
    + EncryptedMessage::serialized_len(FIRST_HALF_PLAINTEXT_LEN)
    + EncryptedMessage::serialized_len(SECOND_HALF_PLAINTEXT_LEN);

/// Which party produced a bundle. Selects the labels its halves use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyBearer {
    /// The user's own key, split on the device.
    User,
    /// The wallet operator's key, split server-side.
    Muun,
}

impl KeyBearer {
    /// Parse the wire byte.
    pub fn from_byte(byte: u8) -> Result<Self, EscrowError> {
        match byte {
            1 => Ok(KeyBearer::User),
            2 => Ok(KeyBearer::Muun),
            other => Err(EscrowError::UnknownBearer(other)),
        }
    }

    /// The wire byte.
    pub fn as_byte(&self) -> u8 {
        match self {
            KeyBearer::User => 1,
            KeyBearer::Muun => 2,
        }
    }

    /// `info` label of the first message.
    pub fn first_half_label(&self) -> &'static str {
        match self {
            KeyBearer::User => USER_FIRST_HALF_TO_RECOVERY_CODE,
            KeyBearer::Muun => MUUN_FIRST_HALF_TO_RECOVERY_CODE,
        }
    }

    /// `info` label of the second message.
    pub fn second_half_label(&self) -> &'static str {
        match self {
            KeyBearer::User => USER_SECOND_HALF_TO_RECOVERY_CODE,
            KeyBearer::Muun => MUUN_SECOND_HALF_TO_RECOVERY_CODE,
        }
    }
}

impl fmt::Display for KeyBearer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyBearer::User => write!(f, "user"),
            KeyBearer::Muun => write!(f, "muun"),
        }
    }
}

/// Two encrypted halves of a private key, both addressed to the recovery code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryKeyBundle {
    bearer: KeyBearer,
    first_message: EncryptedMessage,
    second_message: EncryptedMessage,
}

impl RecoveryKeyBundle {
    /// Assemble a bundle, checking that both messages have the fixed sizes.
    pub fn new(
        bearer: KeyBearer,
        first_message: EncryptedMessage,
        second_message: EncryptedMessage,
    ) -> Result<Self, EscrowError> {
        check_plaintext_len(bearer.first_half_label(), &first_message, FIRST_HALF_PLAINTEXT_LEN)?;
        check_plaintext_len(
            bearer.second_half_label(),
            &second_message,
            SECOND_HALF_PLAINTEXT_LEN,
        )?;
        Ok(RecoveryKeyBundle {
            bearer,
            first_message,
            second_message,
        })
    }

    pub fn version(&self) -> u8 {
        BUNDLE_VERSION
    }

    pub fn bearer(&self) -> KeyBearer {
        self.bearer
    }

    /// Scalar half ‖ chain code.
    pub fn first_message(&self) -> &EncryptedMessage {
        &self.first_message
    }

    /// Scalar half.
    pub fn second_message(&self) -> &EncryptedMessage {
        &self.second_message
    }

    /// Serialize to raw bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(BUNDLE_LEN);
        out.push(BUNDLE_VERSION);
        out.push(self.bearer.as_byte());
        out.extend_from_slice(&self.first_message.to_bytes());
        out.extend_from_slice(&self.second_message.to_bytes());
        out
    }

    /// Parse raw bytes. Nothing is decrypted.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EscrowError> {
        let version = *bytes.first().ok_or(EscrowError::Truncated {
            expected: BUNDLE_LEN,
            actual: 0,
        })?;
        if version != BUNDLE_VERSION {
            return Err(EscrowError::UnsupportedVersion {
                found: version,
                expected: BUNDLE_VERSION,
            });
        }
        let bearer_byte = *bytes.get(1).ok_or(EscrowError::Truncated {
            expected: BUNDLE_LEN,
            actual: bytes.len(),
        })?;
        let bearer = KeyBearer::from_byte(bearer_byte)?;

        if bytes.len() < BUNDLE_LEN {
            return Err(EscrowError::Truncated {
                expected: BUNDLE_LEN,
                actual: bytes.len(),
            });
        }
        if bytes.len() > BUNDLE_LEN {
            return Err(EscrowError::TrailingBytes {
                extra: bytes.len() - BUNDLE_LEN,
            });
        }

        let (first_message, rest) =
            EncryptedMessage::parse_prefix(&bytes[2..], FIRST_HALF_PLAINTEXT_LEN)
                .map_err(EscrowError::crypto(bearer.first_half_label()))?;
        let (second_message, _) =
            EncryptedMessage::parse_prefix(rest, SECOND_HALF_PLAINTEXT_LEN)
                .map_err(EscrowError::crypto(bearer.second_half_label()))?;

        Ok(RecoveryKeyBundle {
            bearer,
            first_message,
            second_message,
        })
    }

    /// Serialize and base64-encode.
    pub fn encode(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(self.to_bytes())
    }

    /// Base64-decode and parse. Exposes version and bearer without the
    /// recovery code.
    pub fn decode(encoded: &str) -> Result<Self, EscrowError> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| EscrowError::InvalidBase64(e.to_string()))?;
        let bundle = Self::from_bytes(&bytes)?;
        debug!(version = BUNDLE_VERSION, bearer = %bundle.bearer, "decoded recovery key bundle");
        Ok(bundle)
    }
}

fn check_plaintext_len(
    label: &'static str,
    message: &EncryptedMessage,
    expected: usize,
) -> Result<(), EscrowError> {
    if message.plaintext_len() != expected {
        return Err(EscrowError::PlaintextLength {
            label,
            expected,
            actual: message.plaintext_len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use escrow_hpke::{seal, OsKeyGenerator};
    use escrow_primitives::ec::PrivateKey;

    use crate::ErrorKind;

    fn sample_bundle(bearer: KeyBearer) -> RecoveryKeyBundle {
        let receiver = PrivateKey::generate().unwrap().pub_key();
        let first = seal(&[1u8; 64], &receiver, b"first", b"", &OsKeyGenerator).unwrap();
        let second = seal(&[2u8; 32], &receiver, b"second", b"", &OsKeyGenerator).unwrap();
        RecoveryKeyBundle::new(bearer, first, second).unwrap()
    }

    #[test]
    fn test_bundle_len() {
        assert_eq!(BUNDLE_LEN, 260);
        assert_eq!(sample_bundle(KeyBearer::User).to_bytes().len(), BUNDLE_LEN);
    }

    #[test]
    fn test_encode_decode_round_trip() {
        for bearer in [KeyBearer::User, KeyBearer::Muun] {
            let bundle = sample_bundle(bearer);
            let decoded = RecoveryKeyBundle::decode(&bundle.encode()).unwrap();
            assert_eq!(decoded, bundle);
            assert_eq!(decoded.version(), 3);
            assert_eq!(decoded.bearer(), bearer);
        }
    }

    /// The header bytes sit at fixed offsets.
    #[test]
    fn test_header_bytes() {
        let bytes = sample_bundle(KeyBearer::Muun).to_bytes();
        assert_eq!(bytes[0], 3);
        assert_eq!(bytes[1], 2);
        assert_eq!(bytes[2], 0x04);
    }

    #[test]
    fn test_decode_rejects_older_version() {
        let encoded = base64::engine::general_purpose::STANDARD.encode([2u8, 0, 1]);
        let err = RecoveryKeyBundle::decode(&encoded).unwrap_err();
        assert!(err.to_string().contains("v2"), "got: {}", err);
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_decode_rejects_trailing_bytes() {
        let mut bytes = sample_bundle(KeyBearer::User).to_bytes();
        bytes.push(0);
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        let err = RecoveryKeyBundle::decode(&encoded).unwrap_err();
        assert!(err.to_string().contains("longer than expected"), "got: {}", err);
    }

    #[test]
    fn test_decode_rejects_truncated_bundle() {
        let bytes = sample_bundle(KeyBearer::User).to_bytes();
        let err = RecoveryKeyBundle::from_bytes(&bytes[..200]).unwrap_err();
        assert!(matches!(err, EscrowError::Truncated { expected: 260, actual: 200 }));
        assert!(matches!(
            RecoveryKeyBundle::from_bytes(&[]),
            Err(EscrowError::Truncated { actual: 0, .. })
        ));
    }

    #[test]
    fn test_decode_rejects_unknown_bearer() {
        let mut bytes = sample_bundle(KeyBearer::User).to_bytes();
        bytes[1] = 3;
        assert!(matches!(
            RecoveryKeyBundle::from_bytes(&bytes),
            Err(EscrowError::UnknownBearer(3))
        ));
    }

    #[test]
    fn test_decode_rejects_bad_base64() {
        let err = RecoveryKeyBundle::decode("not base64!").unwrap_err();
        assert!(matches!(err, EscrowError::InvalidBase64(_)));
    }

    /// A corrupted encapsulated key is reported as a curve error.
    #[test]
    fn test_decode_rejects_invalid_point() {
        let mut bytes = sample_bundle(KeyBearer::User).to_bytes();
        bytes[2] = 0x07;
        let err = RecoveryKeyBundle::from_bytes(&bytes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Curve);
    }

    #[test]
    fn test_new_rejects_swapped_messages() {
        let bundle = sample_bundle(KeyBearer::User);
        let err = RecoveryKeyBundle::new(
            KeyBearer::User,
            bundle.second_message().clone(),
            bundle.first_message().clone(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Integrity);
    }

    #[test]
    fn test_bearer_bytes_and_labels() {
        assert_eq!(KeyBearer::from_byte(1).unwrap(), KeyBearer::User);
        assert_eq!(KeyBearer::Muun.as_byte(), 2);
        assert!(KeyBearer::User.first_half_label().ends_with("/1/1/recovery-code"));
        assert!(KeyBearer::Muun.second_half_label().ends_with("/2/2/recovery-code"));
        assert!(matches!(KeyBearer::from_byte(0), Err(EscrowError::UnknownBearer(0))));
    }
}
