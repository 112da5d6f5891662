//! Hybrid public-key encryption over secp256k1.
//!
//! An RFC 9180 style construction: DHKEM(secp256k1, HKDF-SHA256) for key
//! encapsulation, the labeled HKDF key schedule in base mode, and
//! AES-256-GCM as the AEAD. Only the single-shot API is exposed: one
//! encapsulation seals exactly one message.

mod error;
pub mod labeled;
pub mod kem;
pub mod context;
pub mod encrypted;

pub use error::HpkeError;
pub use encrypted::{open, seal, EncryptedMessage};
pub use kem::{KeyGenerator, OsKeyGenerator, SequenceKeyGenerator, SharedSecret};
