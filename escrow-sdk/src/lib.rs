#![deny(missing_docs)]

//! Recovery-key escrow SDK.
//!
//! Re-exports the escrow components for single-crate usage:
//! - [`primitives`]: secp256k1 keys, hashes, extended keys
//! - [`hpke`]: hybrid encryption and the `EncryptedMessage` format
//! - [`recovery`]: key splitting, recovery-key bundles and verification

pub use escrow_primitives as primitives;
pub use escrow_hpke as hpke;
pub use escrow_recovery as recovery;

pub use escrow_recovery::{EscrowConfig, EscrowError, RecoveryEscrow};
