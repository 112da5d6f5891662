//! Recovery-key escrow primitives.
//!
//! This crate provides the curve-level building blocks used by the escrow:
//! - Hash functions (SHA-256, SHA-256d, RIPEMD-160, Hash160, HMAC-SHA256)
//! - Base58Check encoding for extended keys
//! - secp256k1 private/public keys with scalar and point arithmetic
//! - Root extended private keys rebuilt from a raw scalar and chain code

pub mod hash;
pub mod base58;
pub mod ec;
pub mod hd;

mod error;
pub use error::PrimitivesError;
