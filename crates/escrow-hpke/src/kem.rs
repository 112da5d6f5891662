//! DHKEM(secp256k1, HKDF-SHA256).
//!
//! Encapsulation draws an ephemeral key, performs ECDH with the receiver and
//! runs the result through the labeled extract/expand schedule together with
//! both public keys. Decapsulation rebuilds the same context from the other
//! side. Public keys enter the context in uncompressed form, sender first.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use zeroize::{Zeroize, ZeroizeOnDrop};

use escrow_primitives::ec::public_key::UNCOMPRESSED_LEN;
use escrow_primitives::ec::{PrivateKey, PublicKey};
use escrow_primitives::PrimitivesError;

use crate::labeled::{labeled_expand, labeled_extract};
use crate::HpkeError;

/// KEM identifier for DHKEM(secp256k1, HKDF-SHA256).
pub const KEM_ID: u16 = 0x0016;

/// Length of the KEM shared secret (`Nsecret`).
pub const SHARED_SECRET_LEN: usize = 32;

/// Length of a serialized encapsulated key (`Nenc`).
pub const ENCAPSULATED_KEY_LEN: usize = UNCOMPRESSED_LEN;

/// `"KEM" ‖ I2OSP(KEM_ID, 2)`
fn kem_suite_id() -> [u8; 5] {
    let id = KEM_ID.to_be_bytes();
    [b'K', b'E', b'M', id[0], id[1]]
}

/// Source of fresh private keys for ephemeral and split scalars.
///
/// Production code uses [`OsKeyGenerator`]. Deterministic generators exist
/// so that known-answer tests can pin the otherwise random values; they are
/// passed in explicitly, never switched on at runtime.
pub trait KeyGenerator: Send + Sync {
    /// Produce a private key, or fail if no secure randomness is available.
    fn generate(&self) -> Result<PrivateKey, PrimitivesError>;
}

/// Draws keys from the operating system CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsKeyGenerator;

impl KeyGenerator for OsKeyGenerator {
    fn generate(&self) -> Result<PrivateKey, PrimitivesError> {
        PrivateKey::generate()
    }
}

/// Hands out a fixed list of keys in order, wrapping around at the end.
///
/// Only meant for reproducible test vectors.
pub struct SequenceKeyGenerator {
    keys: Vec<PrivateKey>,
    next: AtomicUsize,
}

impl SequenceKeyGenerator {
    /// Create a generator over `keys`. An empty list makes every call fail.
    pub fn new(keys: Vec<PrivateKey>) -> Self {
        SequenceKeyGenerator {
            keys,
            next: AtomicUsize::new(0),
        }
    }
}

impl KeyGenerator for SequenceKeyGenerator {
    fn generate(&self) -> Result<PrivateKey, PrimitivesError> {
        if self.keys.is_empty() {
            return Err(PrimitivesError::Randomness(
                "sequence key generator has no keys".to_string(),
            ));
        }
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.keys.len();
        Ok(self.keys[index].clone())
    }
}

impl fmt::Debug for SequenceKeyGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceKeyGenerator")
            .field("keys", &self.keys.len())
            .finish()
    }
}

/// KEM shared secret (32 bytes), wiped on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret([u8; SHARED_SECRET_LEN]);

impl SharedSecret {
    /// Get the raw bytes of the shared secret.
    pub fn as_bytes(&self) -> &[u8; SHARED_SECRET_LEN] {
        &self.0
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedSecret")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Encapsulate to `receiver` with an ephemeral key from `keys`.
///
/// # Returns
/// The ephemeral public key (to be sent along) and the shared secret.
pub fn encapsulate(
    receiver: &PublicKey,
    keys: &dyn KeyGenerator,
) -> Result<(PublicKey, SharedSecret), HpkeError> {
    let ephemeral = keys.generate()?;
    let ephemeral_pub = ephemeral.pub_key();
    let dh = ephemeral.derive_shared_secret(receiver)?;
    let shared_secret = extract_and_expand(&dh, &ephemeral_pub, receiver)?;
    Ok((ephemeral_pub, shared_secret))
}

/// Recover the shared secret for an encapsulated key addressed to `receiver`.
pub fn decapsulate(
    receiver: &PrivateKey,
    encapsulated_key: &PublicKey,
) -> Result<SharedSecret, HpkeError> {
    let dh = receiver.derive_shared_secret(encapsulated_key)?;
    extract_and_expand(&dh, encapsulated_key, &receiver.pub_key())
}

fn extract_and_expand(
    dh_point: &PublicKey,
    sender: &PublicKey,
    receiver: &PublicKey,
) -> Result<SharedSecret, HpkeError> {
    let suite_id = kem_suite_id();
    let mut dh = dh_point.x_coordinate();

    let mut kem_context = [0u8; 2 * ENCAPSULATED_KEY_LEN];
    kem_context[..ENCAPSULATED_KEY_LEN].copy_from_slice(&sender.to_uncompressed());
    kem_context[ENCAPSULATED_KEY_LEN..].copy_from_slice(&receiver.to_uncompressed());

    let eae_prk = labeled_extract(b"", b"eae_prk", &dh, &suite_id);
    dh.zeroize();
    let okm = labeled_expand(
        &eae_prk[..],
        b"shared_secret",
        &kem_context,
        SHARED_SECRET_LEN as u16,
        &suite_id,
    )?;

    let mut secret = [0u8; SHARED_SECRET_LEN];
    secret.copy_from_slice(&okm);
    Ok(SharedSecret(secret))
}
