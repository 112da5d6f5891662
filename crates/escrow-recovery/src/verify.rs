//! Verification of server-escrowed key halves.
//!
//! The wallet operator splits its key into two halves: one encrypted to the
//! user's device, one encrypted to the user's recovery code. The device can
//! open its half and, from the operator's public key, compute the public key
//! of the other half. An external zero-knowledge verifier may then confirm
//! that the recovery-code ciphertext really holds that half. The outcome is
//! advisory: a bundle is produced whether or not the proof checks out.

use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::{debug, instrument, warn};

use escrow_hpke::{EncryptedMessage, KeyGenerator};
use escrow_primitives::ec::private_key::PRIVATE_KEY_BYTES_LEN;
use escrow_primitives::ec::{PrivateKey, PublicKey};

use crate::bundle::{KeyBearer, SECOND_HALF_PLAINTEXT_LEN};
use crate::codec::{finish_muun_key_encryption, open_exact, seal_scalar, split_key};
use crate::labels::MUUN_FIRST_HALF_TO_CLIENT;
use crate::EscrowError;

/// Prefix a foreign verifier uses to report that it panicked.
const PANIC_PREFIX: &str = "panic:";

/// What the verifier is asked to confirm: that `ciphertext`, sealed to
/// `recovery_code_pub` with `encapsulated_key`, encrypts the discrete log of
/// `second_half_pub`.
#[derive(Debug, Clone, Copy)]
pub struct ProofRequest<'a> {
    pub proof: &'a str,
    pub recovery_code_pub: &'a PublicKey,
    pub encapsulated_key: &'a PublicKey,
    pub ciphertext: &'a [u8],
    pub second_half_pub: &'a PublicKey,
}

/// Result of a proof check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifierOutcome {
    /// The proof is valid.
    Ok,
    /// The proof was rejected or the verifier could not be reached.
    Error(String),
    /// The verifier crashed.
    Panic(String),
}

impl VerifierOutcome {
    /// Map the string-typed result of a foreign verifier.
    ///
    /// Errors starting with `panic:` are crashes, anything else a rejection.
    pub fn from_ffi_result(result: Result<(), String>) -> Self {
        match result {
            Ok(()) => VerifierOutcome::Ok,
            Err(message) => match message.strip_prefix(PANIC_PREFIX) {
                Some(rest) => VerifierOutcome::Panic(rest.trim().to_string()),
                None => VerifierOutcome::Error(message),
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, VerifierOutcome::Ok)
    }
}

impl fmt::Display for VerifierOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerifierOutcome::Ok => write!(f, "ok"),
            VerifierOutcome::Error(msg) => write!(f, "error: {}", msg),
            VerifierOutcome::Panic(msg) => write!(f, "panic: {}", msg),
        }
    }
}

/// A zero-knowledge proof verifier.
///
/// Implementations must not block indefinitely; wrap remote verifiers in a
/// timeout on the caller side.
pub trait ProofVerifier: Send + Sync {
    fn verify(&self, request: &ProofRequest<'_>) -> VerifierOutcome;
}

/// Adapts a closure returning `Result<(), String>`, such as an FFI binding.
///
/// A panic inside the closure is caught and reported as
/// [`VerifierOutcome::Panic`].
pub struct FnVerifier<F> {
    f: F,
}

impl<F> FnVerifier<F>
where
    F: Fn(&ProofRequest<'_>) -> Result<(), String> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        FnVerifier { f }
    }
}

impl<F> ProofVerifier for FnVerifier<F>
where
    F: Fn(&ProofRequest<'_>) -> Result<(), String> + Send + Sync,
{
    fn verify(&self, request: &ProofRequest<'_>) -> VerifierOutcome {
        match catch_unwind(AssertUnwindSafe(|| (self.f)(request))) {
            Ok(result) => VerifierOutcome::from_ffi_result(result),
            Err(payload) => VerifierOutcome::Panic(panic_message(payload.as_ref())),
        }
    }
}

impl<F> fmt::Debug for FnVerifier<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnVerifier").finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Accepts exactly one designated proof string. For test environments.
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    token: String,
}

impl TokenVerifier {
    pub fn new(token: impl Into<String>) -> Self {
        TokenVerifier {
            token: token.into(),
        }
    }
}

impl ProofVerifier for TokenVerifier {
    fn verify(&self, request: &ProofRequest<'_>) -> VerifierOutcome {
        if request.proof == self.token {
            VerifierOutcome::Ok
        } else {
            VerifierOutcome::Error("proof does not match the accepted token".to_string())
        }
    }
}

/// Stands in when no verifier is linked. Every check reports an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableVerifier;

impl ProofVerifier for UnavailableVerifier {
    fn verify(&self, _request: &ProofRequest<'_>) -> VerifierOutcome {
        VerifierOutcome::Error("proof verifier unavailable".to_string())
    }
}

/// The operator's key halves as delivered to the device, with an optional
/// proof about the recovery-code half.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiableMuunKey {
    first_half_key_encrypted_to_client: EncryptedMessage,
    second_half_key_encrypted_to_recovery_code: EncryptedMessage,
    proof: Option<String>,
}

/// Outcome of [`VerifiableMuunKey::verify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedMuunKey {
    /// Base64 recovery-key bundle with bearer `Muun`.
    pub encrypted_muun_key: String,
    /// Whether a proof was present and accepted.
    pub verified: bool,
}

impl VerifiableMuunKey {
    pub fn new(
        first_half_key_encrypted_to_client: EncryptedMessage,
        second_half_key_encrypted_to_recovery_code: EncryptedMessage,
        proof: Option<String>,
    ) -> Self {
        VerifiableMuunKey {
            first_half_key_encrypted_to_client,
            second_half_key_encrypted_to_recovery_code,
            proof,
        }
    }

    /// Parse both halves from hex, as served by the operator.
    pub fn from_hex(
        first_half_hex: &str,
        second_half_hex: &str,
        proof: Option<String>,
    ) -> Result<Self, EscrowError> {
        let first = EncryptedMessage::from_hex(first_half_hex, PRIVATE_KEY_BYTES_LEN)
            .map_err(EscrowError::crypto(MUUN_FIRST_HALF_TO_CLIENT))?;
        let second_label = KeyBearer::Muun.second_half_label();
        let second = EncryptedMessage::from_hex(second_half_hex, SECOND_HALF_PLAINTEXT_LEN)
            .map_err(EscrowError::crypto(second_label))?;
        Ok(Self::new(first, second, proof))
    }

    /// Split `muun_key` and encrypt the halves for the device and the
    /// recovery code. This is the producing side of [`verify`](Self::verify).
    #[instrument(skip_all)]
    pub fn encrypt(
        muun_key: &PrivateKey,
        client_pub: &PublicKey,
        recovery_code_pub: &PublicKey,
        proof: Option<String>,
        keys: &dyn KeyGenerator,
    ) -> Result<Self, EscrowError> {
        let (first_half, second_half) = split_key(muun_key, keys)?;
        let first = seal_scalar(&first_half, client_pub, MUUN_FIRST_HALF_TO_CLIENT, keys)?;
        let second = seal_scalar(
            &second_half,
            recovery_code_pub,
            KeyBearer::Muun.second_half_label(),
            keys,
        )?;
        Ok(Self::new(first, second, proof))
    }

    pub fn first_half_key_encrypted_to_client(&self) -> &EncryptedMessage {
        &self.first_half_key_encrypted_to_client
    }

    pub fn second_half_key_encrypted_to_recovery_code(&self) -> &EncryptedMessage {
        &self.second_half_key_encrypted_to_recovery_code
    }

    pub fn proof(&self) -> Option<&str> {
        self.proof.as_deref()
    }

    /// Open the device half, check the proof if there is one, and build
    /// the `Muun` recovery-key bundle.
    ///
    /// `verifier` set to `None` skips proof checking. A rejected, crashed
    /// or missing proof only clears `verified`; errors come solely from
    /// decryption, curve arithmetic and bundle encoding.
    #[instrument(skip_all)]
    pub fn verify(
        &self,
        muun_pub: &PublicKey,
        muun_chain_code: &[u8],
        client_key: &PrivateKey,
        recovery_code_pub: &PublicKey,
        verifier: Option<&dyn ProofVerifier>,
        keys: &dyn KeyGenerator,
    ) -> Result<VerifiedMuunKey, EscrowError> {
        let plaintext = open_exact(
            &self.first_half_key_encrypted_to_client,
            client_key,
            MUUN_FIRST_HALF_TO_CLIENT,
            PRIVATE_KEY_BYTES_LEN,
        )?;
        let first_half_key = PrivateKey::from_bytes(&plaintext[..])?;
        let second_half_pub = muun_pub.sub(&first_half_key.pub_key())?;

        let verified = match (self.proof.as_deref(), verifier) {
            (Some(proof), Some(verifier)) => {
                let message = &self.second_half_key_encrypted_to_recovery_code;
                let outcome = verifier.verify(&ProofRequest {
                    proof,
                    recovery_code_pub,
                    encapsulated_key: message.encapsulated_key(),
                    ciphertext: message.ciphertext(),
                    second_half_pub: &second_half_pub,
                });
                if outcome.is_ok() {
                    debug!("proof verified");
                } else {
                    warn!(outcome = %outcome, "proof verification failed");
                }
                outcome.is_ok()
            }
            (None, _) => {
                debug!("no proof supplied");
                false
            }
            (Some(_), None) => {
                debug!("proof verification disabled");
                false
            }
        };

        let encrypted_muun_key = finish_muun_key_encryption(
            recovery_code_pub,
            &first_half_key,
            muun_chain_code,
            &self.second_half_key_encrypted_to_recovery_code,
            keys,
        )?;

        Ok(VerifiedMuunKey {
            encrypted_muun_key,
            verified,
        })
    }
}
