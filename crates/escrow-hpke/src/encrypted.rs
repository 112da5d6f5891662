//! Single-shot encryption and the `EncryptedMessage` wire format.
//!
//! A message is `encapsulated_key (65 bytes, uncompressed) ‖ ciphertext`,
//! where the ciphertext carries a trailing 16-byte tag. The format is not
//! self-delimiting: a reader must know the plaintext length in advance to
//! split a stream of concatenated messages.

use tracing::debug;
use zeroize::Zeroizing;

use escrow_primitives::ec::{PrivateKey, PublicKey};

use crate::context::{AeadContext, TAG_LEN};
use crate::kem::{decapsulate, encapsulate, KeyGenerator, ENCAPSULATED_KEY_LEN};
use crate::HpkeError;

/// An encapsulated key together with the AEAD ciphertext it unlocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedMessage {
    encapsulated_key: PublicKey,
    ciphertext: Vec<u8>,
}

impl EncryptedMessage {
    /// Assemble a message from its parts.
    ///
    /// # Returns
    /// `MessageTooShort` if `ciphertext` cannot even hold the tag.
    pub fn new(encapsulated_key: PublicKey, ciphertext: Vec<u8>) -> Result<Self, HpkeError> {
        if ciphertext.len() < TAG_LEN {
            return Err(HpkeError::MessageTooShort {
                expected: TAG_LEN,
                actual: ciphertext.len(),
            });
        }
        Ok(EncryptedMessage {
            encapsulated_key,
            ciphertext,
        })
    }

    /// The sender's ephemeral public key.
    pub fn encapsulated_key(&self) -> &PublicKey {
        &self.encapsulated_key
    }

    /// Ciphertext including the authentication tag.
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// Length of the plaintext this message decrypts to.
    pub fn plaintext_len(&self) -> usize {
        self.ciphertext.len() - TAG_LEN
    }

    /// Serialized size of a message carrying `plaintext_len` bytes.
    pub const fn serialized_len(plaintext_len: usize) -> usize {
        ENCAPSULATED_KEY_LEN + plaintext_len + TAG_LEN
    }

    /// `encapsulated_key ‖ ciphertext`
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(ENCAPSULATED_KEY_LEN + self.ciphertext.len());
        out.extend_from_slice(&self.encapsulated_key.to_uncompressed());
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Read one message of known plaintext length off the front of `bytes`.
    ///
    /// # Returns
    /// The message and whatever follows it.
    pub fn parse_prefix(bytes: &[u8], plaintext_len: usize) -> Result<(Self, &[u8]), HpkeError> {
        let total = Self::serialized_len(plaintext_len);
        if bytes.len() < total {
            return Err(HpkeError::MessageTooShort {
                expected: total,
                actual: bytes.len(),
            });
        }
        let (key_bytes, rest) = bytes.split_at(ENCAPSULATED_KEY_LEN);
        let (ciphertext, rest) = rest.split_at(plaintext_len + TAG_LEN);
        let encapsulated_key = PublicKey::from_bytes(key_bytes)?;
        let message = EncryptedMessage::new(encapsulated_key, ciphertext.to_vec())?;
        Ok((message, rest))
    }

    /// Parse a message that must be exactly `serialized_len(plaintext_len)` long.
    pub fn from_bytes(bytes: &[u8], plaintext_len: usize) -> Result<Self, HpkeError> {
        let expected = Self::serialized_len(plaintext_len);
        if bytes.len() != expected {
            return Err(HpkeError::LengthMismatch {
                expected,
                actual: bytes.len(),
            });
        }
        let (message, _) = Self::parse_prefix(bytes, plaintext_len)?;
        Ok(message)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    pub fn from_hex(hex_str: &str, plaintext_len: usize) -> Result<Self, HpkeError> {
        let bytes = hex::decode(hex_str).map_err(escrow_primitives::PrimitivesError::from)?;
        Self::from_bytes(&bytes, plaintext_len)
    }

    /// Decrypt with the receiver's private key. Same as [`open`].
    pub fn decrypt(
        &self,
        receiver: &PrivateKey,
        info: &[u8],
        aad: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, HpkeError> {
        open(self, receiver, info, aad)
    }
}

/// Encrypt `plaintext` to `receiver` under `info`, authenticating `aad`.
///
/// A fresh ephemeral key is drawn from `keys` for every call.
pub fn seal(
    plaintext: &[u8],
    receiver: &PublicKey,
    info: &[u8],
    aad: &[u8],
    keys: &dyn KeyGenerator,
) -> Result<EncryptedMessage, HpkeError> {
    let (encapsulated_key, shared_secret) = encapsulate(receiver, keys)?;
    let ciphertext = AeadContext::new(&shared_secret, info)?.seal(aad, plaintext)?;
    debug!(
        plaintext_len = plaintext.len(),
        info = %String::from_utf8_lossy(info),
        "sealed message"
    );
    EncryptedMessage::new(encapsulated_key, ciphertext)
}

/// Decrypt `message` with `receiver`, checking `info` and `aad`.
///
/// Any mismatch (wrong key, wrong info, wrong aad or modified bytes)
/// yields [`HpkeError::Authentication`]; no partial plaintext is returned.
pub fn open(
    message: &EncryptedMessage,
    receiver: &PrivateKey,
    info: &[u8],
    aad: &[u8],
) -> Result<Zeroizing<Vec<u8>>, HpkeError> {
    let shared_secret = decapsulate(receiver, &message.encapsulated_key)?;
    let plaintext = AeadContext::new(&shared_secret, info)?.open(aad, &message.ciphertext);
    if plaintext.is_err() {
        debug!(info = %String::from_utf8_lossy(info), "message failed authentication");
    }
    plaintext
}
