//! Recovery-key escrow.
//!
//! Splits a wallet key into two additive halves, encrypts both to the
//! user's recovery code as a versioned bundle, and rebuilds the key from
//! such a bundle during recovery. Server-held keys arrive pre-split with an
//! optional zero-knowledge proof that is checked before the bundle is
//! produced.

mod error;
pub mod labels;
pub mod bundle;
pub mod codec;
pub mod verify;
pub mod recovery_code;
pub mod config;
mod escrow;

pub use error::{ErrorKind, EscrowError};
pub use bundle::{KeyBearer, RecoveryKeyBundle};
pub use codec::{decrypt_extended_key, encrypt_user_key, finish_muun_key_encryption};
pub use verify::{
    FnVerifier, ProofRequest, ProofVerifier, TokenVerifier, UnavailableVerifier,
    VerifiableMuunKey, VerifiedMuunKey, VerifierOutcome,
};
pub use recovery_code::{RecoveryCode, RecoveryCodeVersion};
pub use config::EscrowConfig;
pub use escrow::RecoveryEscrow;
