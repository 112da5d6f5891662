//! Recovery codes: the user-memorizable secret behind the recovery key.
//!
//! A code is 32 symbols in 8 dash-separated groups of 4, drawn from a
//! 28-symbol alphabet without look-alike characters. Current codes start
//! with `L2` (the `2` is outside the alphabet, so the prefix cannot occur in
//! a legacy code) and map to a key with HMAC-SHA256. Legacy codes map to a
//! key with scrypt and a per-user salt.

use std::fmt;

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use zeroize::Zeroizing;

use escrow_primitives::ec::private_key::PRIVATE_KEY_BYTES_LEN;
use escrow_primitives::ec::PrivateKey;
use escrow_primitives::hash::sha256_hmac;
use escrow_primitives::PrimitivesError;

use crate::EscrowError;

/// Symbols a recovery code is made of.
pub const ALPHABET: &[u8] = b"ABCDEFHJKLMNPQRSTUWXY3456789";

/// Prefix of current-version codes.
pub const CURRENT_VERSION_PREFIX: &str = "L2";

const GROUPS: usize = 8;
const GROUP_LEN: usize = 4;
const CODE_LEN: usize = GROUPS * GROUP_LEN;

/// HMAC key for current-version codes.
const HMAC_KEY: &[u8] = b"muun.com/recovery-code/v2";

// scrypt parameters for legacy codes: N = 2^9, r = 8, p = 1.
const SCRYPT_LOG_N: u8 = 9;
const SCRYPT_R: u32 = 8;
const SCRYPT_P: u32 = 1;

/// Recovery code format version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryCodeVersion {
    /// scrypt-derived, needs a salt.
    Legacy,
    /// HMAC-SHA256 derived.
    Current,
}

/// A validated, normalized recovery code. Wiped on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct RecoveryCode {
    code: Zeroizing<String>,
    version: RecoveryCodeVersion,
}

impl RecoveryCode {
    /// Parse user input. Case, surrounding whitespace and missing dashes
    /// are tolerated.
    pub fn parse(input: &str) -> Result<Self, EscrowError> {
        let symbols: Zeroizing<String> = Zeroizing::new(
            input
                .chars()
                .filter(|c| *c != '-' && !c.is_whitespace())
                .map(|c| c.to_ascii_uppercase())
                .collect(),
        );
        if symbols.len() != CODE_LEN || !symbols.is_ascii() {
            return Err(EscrowError::InvalidRecoveryCode(format!(
                "expected {} symbols, got {}",
                CODE_LEN,
                symbols.chars().count()
            )));
        }

        let (version, body) = match symbols.strip_prefix(CURRENT_VERSION_PREFIX) {
            Some(rest) => (RecoveryCodeVersion::Current, rest),
            None => (RecoveryCodeVersion::Legacy, symbols.as_str()),
        };
        if let Some(position) = body.bytes().position(|b| !ALPHABET.contains(&b)) {
            return Err(EscrowError::InvalidRecoveryCode(format!(
                "invalid symbol at position {}",
                position + CODE_LEN - body.len()
            )));
        }

        Ok(RecoveryCode {
            code: group(symbols.as_bytes()),
            version,
        })
    }

    /// Generate a new current-version code from the OS CSPRNG.
    pub fn generate() -> Result<Self, EscrowError> {
        Self::generate_with(&mut OsRng)
    }

    /// Generate a new current-version code from `rng`.
    pub fn generate_with<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self, EscrowError> {
        let mut symbols = Zeroizing::new(Vec::with_capacity(CODE_LEN));
        symbols.extend_from_slice(CURRENT_VERSION_PREFIX.as_bytes());

        // Largest multiple of the alphabet size that fits in a byte, so that
        // reduction modulo the alphabet size is unbiased.
        let limit = (256 / ALPHABET.len() * ALPHABET.len()) as u8;
        let mut buf = Zeroizing::new([0u8; 32]);
        while symbols.len() < CODE_LEN {
            rng.try_fill_bytes(&mut buf[..])
                .map_err(|e| EscrowError::Curve(PrimitivesError::Randomness(e.to_string())))?;
            for &b in buf.iter().filter(|&&b| b < limit) {
                if symbols.len() == CODE_LEN {
                    break;
                }
                symbols.push(ALPHABET[b as usize % ALPHABET.len()]);
            }
        }

        Ok(RecoveryCode {
            code: group(&symbols),
            version: RecoveryCodeVersion::Current,
        })
    }

    pub fn version(&self) -> RecoveryCodeVersion {
        self.version
    }

    /// The normalized code, `XXXX-XXXX-...`.
    pub fn as_str(&self) -> &str {
        &self.code
    }

    /// Derive the recovery-code private key.
    ///
    /// Legacy codes require `salt`; current codes ignore it.
    pub fn to_private_key(&self, salt: Option<&[u8]>) -> Result<PrivateKey, EscrowError> {
        let seed = match self.version {
            RecoveryCodeVersion::Current => {
                Zeroizing::new(sha256_hmac(HMAC_KEY, self.code.as_bytes()))
            }
            RecoveryCodeVersion::Legacy => {
                let salt = salt.ok_or_else(|| {
                    EscrowError::InvalidRecoveryCode(
                        "legacy recovery codes need a salt".to_string(),
                    )
                })?;
                let params =
                    scrypt::Params::new(SCRYPT_LOG_N, SCRYPT_R, SCRYPT_P, PRIVATE_KEY_BYTES_LEN)
                        .map_err(|e| EscrowError::InvalidConfig(e.to_string()))?;
                let mut out = Zeroizing::new([0u8; PRIVATE_KEY_BYTES_LEN]);
                scrypt::scrypt(self.code.as_bytes(), salt, &params, &mut out[..])
                    .map_err(|e| EscrowError::InvalidConfig(e.to_string()))?;
                out
            }
        };
        Ok(PrivateKey::from_bytes_mod_order(&seed)?)
    }
}

impl fmt::Debug for RecoveryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecoveryCode")
            .field("version", &self.version)
            .field("code", &"[REDACTED]")
            .finish()
    }
}

/// Insert a dash between groups.
fn group(symbols: &[u8]) -> Zeroizing<String> {
    let mut out = Zeroizing::new(String::with_capacity(CODE_LEN + GROUPS - 1));
    for (i, chunk) in symbols.chunks(GROUP_LEN).enumerate() {
        if i > 0 {
            out.push('-');
        }
        out.extend(chunk.iter().map(|&b| b as char));
    }
    out
}
