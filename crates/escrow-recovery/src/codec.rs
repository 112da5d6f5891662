//! Additive secret splitting into recovery-key bundles.
//!
//! A private key `k` is split as `k = a + b (mod n)` with `a` drawn fresh.
//! Both halves are encrypted to the recovery-code public key under labels
//! chosen by the bearer; the chain code travels with the first half.

use tracing::{debug, instrument};
use zeroize::Zeroizing;

use escrow_hpke::{seal, EncryptedMessage, KeyGenerator};
use escrow_primitives::ec::private_key::PRIVATE_KEY_BYTES_LEN;
use escrow_primitives::ec::{PrivateKey, PublicKey};
use escrow_primitives::hd::{ExtendedPrivateKey, Network, CHAIN_CODE_LEN};
use escrow_primitives::PrimitivesError;

use crate::bundle::{
    KeyBearer, RecoveryKeyBundle, FIRST_HALF_PLAINTEXT_LEN, SECOND_HALF_PLAINTEXT_LEN,
};
use crate::EscrowError;

/// How many times a split scalar is redrawn before giving up.
const MAX_SPLIT_ATTEMPTS: usize = 16;

/// Split `key` into two non-zero halves whose sum is `key`.
///
/// The first half comes from `keys`. It is redrawn in the negligible case
/// where it equals `key`, which would make the second half zero.
pub(crate) fn split_key(
    key: &PrivateKey,
    keys: &dyn KeyGenerator,
) -> Result<(PrivateKey, PrivateKey), EscrowError> {
    for _ in 0..MAX_SPLIT_ATTEMPTS {
        let first = keys.generate()?;
        if let Ok(second) = key.sub(&first) {
            return Ok((first, second));
        }
    }
    Err(EscrowError::Curve(PrimitivesError::Randomness(
        "key generator keeps returning the key being split".to_string(),
    )))
}

/// Encrypt `scalar ‖ chain_code` to the recovery code under `label`.
pub(crate) fn seal_first_half(
    half: &PrivateKey,
    chain_code: &[u8],
    recovery_code_pub: &PublicKey,
    label: &'static str,
    keys: &dyn KeyGenerator,
) -> Result<EncryptedMessage, EscrowError> {
    if chain_code.len() != CHAIN_CODE_LEN {
        return Err(EscrowError::InvalidChainCode {
            expected: CHAIN_CODE_LEN,
            actual: chain_code.len(),
        });
    }
    let mut plaintext = Zeroizing::new(Vec::with_capacity(FIRST_HALF_PLAINTEXT_LEN));
    plaintext.extend_from_slice(&half.to_bytes()[..]);
    plaintext.extend_from_slice(chain_code);
    seal(&plaintext, recovery_code_pub, label.as_bytes(), b"", keys)
        .map_err(EscrowError::crypto(label))
}

/// Encrypt a bare scalar half under `label`.
pub(crate) fn seal_scalar(
    half: &PrivateKey,
    receiver: &PublicKey,
    label: &'static str,
    keys: &dyn KeyGenerator,
) -> Result<EncryptedMessage, EscrowError> {
    seal(&half.to_bytes()[..], receiver, label.as_bytes(), b"", keys)
        .map_err(EscrowError::crypto(label))
}

/// Decrypt a message that must hold exactly `expected` bytes.
pub(crate) fn open_exact(
    message: &EncryptedMessage,
    receiver: &PrivateKey,
    label: &'static str,
    expected: usize,
) -> Result<Zeroizing<Vec<u8>>, EscrowError> {
    let plaintext = message
        .decrypt(receiver, label.as_bytes(), b"")
        .map_err(EscrowError::crypto(label))?;
    if plaintext.len() != expected {
        return Err(EscrowError::PlaintextLength {
            label,
            expected,
            actual: plaintext.len(),
        });
    }
    Ok(plaintext)
}

/// Split the user's key and encrypt both halves to the recovery code.
///
/// # Returns
/// The base64 bundle with bearer `User`.
#[instrument(skip_all)]
pub fn encrypt_user_key(
    user_key: &ExtendedPrivateKey,
    recovery_code_pub: &PublicKey,
    keys: &dyn KeyGenerator,
) -> Result<String, EscrowError> {
    let bearer = KeyBearer::User;
    let (first_half, second_half) = split_key(user_key.ec_private_key(), keys)?;

    let first_message = seal_first_half(
        &first_half,
        user_key.chain_code(),
        recovery_code_pub,
        bearer.first_half_label(),
        keys,
    )?;
    let second_message =
        seal_scalar(&second_half, recovery_code_pub, bearer.second_half_label(), keys)?;

    let bundle = RecoveryKeyBundle::new(bearer, first_message, second_message)?;
    debug!(bearer = %bearer, "encrypted user key");
    Ok(bundle.encode())
}

/// Complete a `Muun` bundle from the first half and an already encrypted
/// second half.
///
/// `second_half_message` must have been produced under the Muun
/// second-half label; it is embedded as is.
#[instrument(skip_all)]
pub fn finish_muun_key_encryption(
    recovery_code_pub: &PublicKey,
    first_half_key: &PrivateKey,
    chain_code: &[u8],
    second_half_message: &EncryptedMessage,
    keys: &dyn KeyGenerator,
) -> Result<String, EscrowError> {
    let bearer = KeyBearer::Muun;
    let first_message = seal_first_half(
        first_half_key,
        chain_code,
        recovery_code_pub,
        bearer.first_half_label(),
        keys,
    )?;
    let bundle = RecoveryKeyBundle::new(bearer, first_message, second_half_message.clone())?;
    debug!(bearer = %bearer, "finished muun key encryption");
    Ok(bundle.encode())
}

/// Reconstruct the escrowed key from a base64 bundle.
///
/// The result is a fresh root key: depth, parent fingerprint and child
/// number of the original key are not part of the bundle.
#[instrument(skip_all)]
pub fn decrypt_extended_key(
    recovery_code_key: &PrivateKey,
    encoded: &str,
    network: Network,
) -> Result<ExtendedPrivateKey, EscrowError> {
    let bundle = RecoveryKeyBundle::decode(encoded)?;
    let bearer = bundle.bearer();

    let first = open_exact(
        bundle.first_message(),
        recovery_code_key,
        bearer.first_half_label(),
        FIRST_HALF_PLAINTEXT_LEN,
    )?;
    let second = open_exact(
        bundle.second_message(),
        recovery_code_key,
        bearer.second_half_label(),
        SECOND_HALF_PLAINTEXT_LEN,
    )?;

    let first_half = PrivateKey::from_bytes(&first[..PRIVATE_KEY_BYTES_LEN])?;
    let chain_code = &first[PRIVATE_KEY_BYTES_LEN..];
    let second_half = PrivateKey::from_bytes(&second[..])?;
    let private_key = first_half.add(&second_half)?;

    let key = ExtendedPrivateKey::new_root(private_key, chain_code, network)?;
    debug!(bearer = %bearer, network = %network, "decrypted extended key");
    Ok(key)
}
