use std::fmt;
use std::sync::Arc;

use escrow_hpke::{KeyGenerator, OsKeyGenerator};
use escrow_primitives::ec::{PrivateKey, PublicKey};
use escrow_primitives::hd::ExtendedPrivateKey;

use crate::codec::{decrypt_extended_key, encrypt_user_key};
use crate::config::EscrowConfig;
use crate::verify::{ProofVerifier, UnavailableVerifier, VerifiableMuunKey, VerifiedMuunKey};
use crate::EscrowError;

/// Escrow operations bound to a configuration, a key generator and a
/// proof verifier.
///
/// Holds no per-call state, so one instance can be shared across threads.
#[derive(Clone)]
pub struct RecoveryEscrow {
    config: EscrowConfig,
    keys: Arc<dyn KeyGenerator>,
    verifier: Arc<dyn ProofVerifier>,
}

impl RecoveryEscrow {
    /// OS randomness and no linked verifier.
    pub fn new(config: EscrowConfig) -> Self {
        RecoveryEscrow {
            config,
            keys: Arc::new(OsKeyGenerator),
            verifier: Arc::new(UnavailableVerifier),
        }
    }

    pub fn with_key_generator(mut self, keys: Arc<dyn KeyGenerator>) -> Self {
        self.keys = keys;
        self
    }

    pub fn with_verifier(mut self, verifier: Arc<dyn ProofVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    pub fn config(&self) -> &EscrowConfig {
        &self.config
    }

    /// See [`encrypt_user_key`].
    pub fn encrypt_user_key(
        &self,
        user_key: &ExtendedPrivateKey,
        recovery_code_pub: &PublicKey,
    ) -> Result<String, EscrowError> {
        encrypt_user_key(user_key, recovery_code_pub, self.keys.as_ref())
    }

    /// See [`decrypt_extended_key`]. Keys come back for the configured network.
    pub fn decrypt_extended_key(
        &self,
        recovery_code_key: &PrivateKey,
        encoded: &str,
    ) -> Result<ExtendedPrivateKey, EscrowError> {
        decrypt_extended_key(recovery_code_key, encoded, self.config.network)
    }

    /// See [`VerifiableMuunKey::encrypt`].
    pub fn encrypt_muun_key(
        &self,
        muun_key: &PrivateKey,
        client_pub: &PublicKey,
        recovery_code_pub: &PublicKey,
        proof: Option<String>,
    ) -> Result<VerifiableMuunKey, EscrowError> {
        VerifiableMuunKey::encrypt(
            muun_key,
            client_pub,
            recovery_code_pub,
            proof,
            self.keys.as_ref(),
        )
    }

    /// See [`VerifiableMuunKey::verify`]. The verifier is skipped when
    /// `verify_proofs` is off.
    pub fn verify_muun_key(
        &self,
        key: &VerifiableMuunKey,
        muun_pub: &PublicKey,
        muun_chain_code: &[u8],
        client_key: &PrivateKey,
        recovery_code_pub: &PublicKey,
    ) -> Result<VerifiedMuunKey, EscrowError> {
        let verifier = self.config.verify_proofs.then(|| self.verifier.as_ref());
        key.verify(
            muun_pub,
            muun_chain_code,
            client_key,
            recovery_code_pub,
            verifier,
            self.keys.as_ref(),
        )
    }
}

impl Default for RecoveryEscrow {
    fn default() -> Self {
        RecoveryEscrow::new(EscrowConfig::default())
    }
}

impl fmt::Debug for RecoveryEscrow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecoveryEscrow")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
