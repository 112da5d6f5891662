//! Escrow configuration.
//!
//! Loaded from `ESCROW_*` environment variables, falling back to defaults
//! for anything unset:
//!
//! - `ESCROW_VERIFY_PROOFS`: `true`/`false` (default `true`)
//! - `ESCROW_NETWORK`: `mainnet`/`testnet` (default `mainnet`)

use std::env;

use serde::{Deserialize, Serialize};
use tracing::debug;

use escrow_primitives::hd::Network;

use crate::EscrowError;

pub const ENV_VERIFY_PROOFS: &str = "ESCROW_VERIFY_PROOFS";
pub const ENV_NETWORK: &str = "ESCROW_NETWORK";

/// Settings for [`RecoveryEscrow`](crate::RecoveryEscrow).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EscrowConfig {
    /// Consult the proof verifier when a server key carries a proof.
    /// When off, verification always reports `verified = false`.
    pub verify_proofs: bool,
    /// Network reconstructed extended keys are serialized for.
    pub network: Network,
}

impl Default for EscrowConfig {
    fn default() -> Self {
        EscrowConfig {
            verify_proofs: true,
            network: Network::Mainnet,
        }
    }
}

impl EscrowConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, EscrowError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, EscrowError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = EscrowConfig::default();

        if let Some(value) = lookup(ENV_VERIFY_PROOFS) {
            config.verify_proofs = parse_bool(&value).ok_or_else(|| {
                EscrowError::InvalidConfig(format!(
                    "{} must be true or false, got {:?}",
                    ENV_VERIFY_PROOFS, value
                ))
            })?;
        }
        if let Some(value) = lookup(ENV_NETWORK) {
            config.network = Network::from_name(&value).ok_or_else(|| {
                EscrowError::InvalidConfig(format!(
                    "{} must be mainnet or testnet, got {:?}",
                    ENV_NETWORK, value
                ))
            })?;
        }

        debug!(
            verify_proofs = config.verify_proofs,
            network = %config.network,
            "loaded escrow config"
        );
        Ok(config)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
