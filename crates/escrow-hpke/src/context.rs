//! Key schedule and AEAD context (RFC 9180 §5, base mode).
//!
//! The KEM shared secret and the caller's `info` string are turned into an
//! AES-256-GCM key and base nonce. A context seals or opens exactly one
//! message, so the nonce is always the base nonce.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use zeroize::Zeroizing;

use crate::kem::{SharedSecret, KEM_ID};
use crate::labeled::{labeled_expand, labeled_extract};
use crate::HpkeError;

/// KDF identifier for HKDF-SHA256.
pub const KDF_ID: u16 = 0x0001;

/// AEAD identifier for AES-256-GCM.
pub const AEAD_ID: u16 = 0x0002;

/// AEAD key length (`Nk`).
pub const KEY_LEN: usize = 32;

/// AEAD nonce length (`Nn`).
pub const NONCE_LEN: usize = 12;

/// AEAD authentication tag length (`Nt`).
pub const TAG_LEN: usize = 16;

/// Base mode: no PSK, no sender authentication.
const MODE_BASE: u8 = 0x00;

/// `"HPKE" ‖ I2OSP(kem_id, 2) ‖ I2OSP(kdf_id, 2) ‖ I2OSP(aead_id, 2)`
pub fn suite_id() -> [u8; 10] {
    hpke_suite_id(KEM_ID, KDF_ID, AEAD_ID)
}

fn hpke_suite_id(kem_id: u16, kdf_id: u16, aead_id: u16) -> [u8; 10] {
    let mut out = [0u8; 10];
    out[..4].copy_from_slice(b"HPKE");
    out[4..6].copy_from_slice(&kem_id.to_be_bytes());
    out[6..8].copy_from_slice(&kdf_id.to_be_bytes());
    out[8..10].copy_from_slice(&aead_id.to_be_bytes());
    out
}

/// Derive `(key, base_nonce)` from a shared secret in base mode.
pub(crate) fn key_schedule(
    suite_id: &[u8],
    shared_secret: &[u8],
    info: &[u8],
    key_len: u16,
    nonce_len: u16,
) -> Result<(Zeroizing<Vec<u8>>, Zeroizing<Vec<u8>>), HpkeError> {
    let psk_id_hash = labeled_extract(b"", b"psk_id_hash", b"", suite_id);
    let info_hash = labeled_extract(b"", b"info_hash", info, suite_id);

    let mut context = Vec::with_capacity(1 + psk_id_hash.len() + info_hash.len());
    context.push(MODE_BASE);
    context.extend_from_slice(&psk_id_hash[..]);
    context.extend_from_slice(&info_hash[..]);

    let secret = labeled_extract(shared_secret, b"secret", b"", suite_id);
    let key = labeled_expand(&secret[..], b"key", &context, key_len, suite_id)?;
    let base_nonce = labeled_expand(&secret[..], b"base_nonce", &context, nonce_len, suite_id)?;
    Ok((key, base_nonce))
}

/// A single-use AEAD context bound to one shared secret and `info`.
///
/// `seal` and `open` consume the context so that a nonce can never be
/// used twice.
pub struct AeadContext {
    key: Zeroizing<Vec<u8>>,
    nonce: [u8; NONCE_LEN],
}

impl AeadContext {
    /// Run the key schedule for `shared_secret` and `info`.
    pub fn new(shared_secret: &SharedSecret, info: &[u8]) -> Result<Self, HpkeError> {
        let (key, base_nonce) = key_schedule(
            &suite_id(),
            shared_secret.as_bytes(),
            info,
            KEY_LEN as u16,
            NONCE_LEN as u16,
        )?;
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&base_nonce);
        Ok(AeadContext { key, nonce })
    }

    /// Encrypt `plaintext`, authenticating `aad` alongside it.
    ///
    /// The result is the ciphertext with the 16-byte tag appended.
    pub fn seal(self, aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, HpkeError> {
        let cipher = self.cipher()?;
        cipher
            .encrypt(
                Nonce::from_slice(&self.nonce),
                Payload {
                    msg: plaintext,
                    aad,
                },
            )
            .map_err(|e| HpkeError::Encryption(e.to_string()))
    }

    /// Decrypt and authenticate `ciphertext` (with trailing tag) against `aad`.
    pub fn open(self, aad: &[u8], ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>, HpkeError> {
        if ciphertext.len() < TAG_LEN {
            return Err(HpkeError::MessageTooShort {
                expected: TAG_LEN,
                actual: ciphertext.len(),
            });
        }
        let cipher = self.cipher()?;
        cipher
            .decrypt(
                Nonce::from_slice(&self.nonce),
                Payload {
                    msg: ciphertext,
                    aad,
                },
            )
            .map(Zeroizing::new)
            .map_err(|_| HpkeError::Authentication)
    }

    fn cipher(&self) -> Result<Aes256Gcm, HpkeError> {
        Aes256Gcm::new_from_slice(&self.key).map_err(|e| HpkeError::KeyDerivation(e.to_string()))
    }
}
