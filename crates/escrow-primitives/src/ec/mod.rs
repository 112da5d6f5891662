//! Elliptic curve cryptography on secp256k1.
//!
//! Private keys carry scalar arithmetic modulo the group order, public keys
//! carry point arithmetic. Together they express additive secret splitting:
//! if `a + b = k` then `a·G + b·G = k·G`.

pub mod private_key;
pub mod public_key;

pub use private_key::PrivateKey;
pub use public_key::PublicKey;
