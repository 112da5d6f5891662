//! Extended (BIP32-style) private keys.
//!
//! Only what recovery needs is provided: building a root extended key from a
//! raw scalar and chain code, the accessors for its parts, and the standard
//! 78-byte Base58Check serialization. Child derivation lives elsewhere.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::base58::{check_decode, check_encode};
use crate::ec::{PrivateKey, PublicKey};
use crate::hash::hash160;
use crate::PrimitivesError;

/// Length of an extended key chain code in bytes.
pub const CHAIN_CODE_LEN: usize = 32;

/// Length of a serialized extended key payload (before the checksum).
const SERIALIZED_LEN: usize = 78;

/// Bitcoin network an extended key is serialized for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
}

impl Network {
    /// Parse a network name (`mainnet` or `testnet`, case-insensitive).
    pub fn from_name(name: &str) -> Option<Network> {
        match name.trim().to_ascii_lowercase().as_str() {
            "mainnet" => Some(Network::Mainnet),
            "testnet" => Some(Network::Testnet),
            _ => None,
        }
    }

    /// Version bytes of a serialized extended private key (`xprv`/`tprv`).
    pub fn private_version(&self) -> [u8; 4] {
        match self {
            Network::Mainnet => [0x04, 0x88, 0xad, 0xe4],
            Network::Testnet => [0x04, 0x35, 0x83, 0x94],
        }
    }

    /// Version bytes of a serialized extended public key (`xpub`/`tpub`).
    pub fn public_version(&self) -> [u8; 4] {
        match self {
            Network::Mainnet => [0x04, 0x88, 0xb2, 0x1e],
            Network::Testnet => [0x04, 0x35, 0x87, 0xcf],
        }
    }

    fn from_private_version(version: &[u8]) -> Option<Network> {
        [Network::Mainnet, Network::Testnet]
            .into_iter()
            .find(|network| network.private_version() == version)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Testnet => write!(f, "testnet"),
        }
    }
}

/// An extended private key: a secp256k1 private key plus chain code and
/// its position in a derivation tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtendedPrivateKey {
    private_key: PrivateKey,
    chain_code: [u8; CHAIN_CODE_LEN],
    depth: u8,
    parent_fingerprint: [u8; 4],
    child_number: u32,
    network: Network,
}

impl ExtendedPrivateKey {
    /// Build a root extended key (depth 0, no parent) from its raw parts.
    ///
    /// # Returns
    /// `InvalidChainCode` unless `chain_code` is exactly 32 bytes.
    pub fn new_root(
        private_key: PrivateKey,
        chain_code: &[u8],
        network: Network,
    ) -> Result<Self, PrimitivesError> {
        let chain_code: [u8; CHAIN_CODE_LEN] = chain_code
            .try_into()
            .map_err(|_| PrimitivesError::InvalidChainCode(chain_code.len()))?;
        Ok(ExtendedPrivateKey {
            private_key,
            chain_code,
            depth: 0,
            parent_fingerprint: [0u8; 4],
            child_number: 0,
            network,
        })
    }

    /// Parse a Base58Check serialized extended private key (`xprv`/`tprv`).
    pub fn from_base58(encoded: &str) -> Result<Self, PrimitivesError> {
        let payload = zeroize::Zeroizing::new(check_decode(encoded)?);
        if payload.len() != SERIALIZED_LEN {
            return Err(PrimitivesError::InvalidExtendedKey(format!(
                "expected {} bytes, got {}",
                SERIALIZED_LEN,
                payload.len()
            )));
        }
        let network = Network::from_private_version(&payload[0..4]).ok_or_else(|| {
            PrimitivesError::InvalidExtendedKey(format!(
                "unknown private key version {}",
                hex::encode(&payload[0..4])
            ))
        })?;
        let depth = payload[4];
        let mut parent_fingerprint = [0u8; 4];
        parent_fingerprint.copy_from_slice(&payload[5..9]);
        let mut child_bytes = [0u8; 4];
        child_bytes.copy_from_slice(&payload[9..13]);
        let child_number = u32::from_be_bytes(child_bytes);
        if depth == 0 && (parent_fingerprint != [0u8; 4] || child_number != 0) {
            return Err(PrimitivesError::InvalidExtendedKey(
                "root key with parent fingerprint or child number".to_string(),
            ));
        }
        let mut chain_code = [0u8; CHAIN_CODE_LEN];
        chain_code.copy_from_slice(&payload[13..45]);
        if payload[45] != 0x00 {
            return Err(PrimitivesError::InvalidExtendedKey(
                "private key data must start with 0x00".to_string(),
            ));
        }
        let private_key = PrivateKey::from_bytes(&payload[46..78])?;

        Ok(ExtendedPrivateKey {
            private_key,
            chain_code,
            depth,
            parent_fingerprint,
            child_number,
            network,
        })
    }

    /// Serialize as a Base58Check `xprv`/`tprv` string.
    pub fn to_base58(&self) -> String {
        let mut payload = zeroize::Zeroizing::new(self.header(self.network.private_version()));
        payload.push(0x00);
        payload.extend_from_slice(&self.private_key.to_bytes()[..]);
        check_encode(&payload)
    }

    /// Serialize the matching extended public key as `xpub`/`tpub`.
    pub fn public_base58(&self) -> String {
        let mut payload = self.header(self.network.public_version());
        payload.extend_from_slice(&self.ec_pub_key().to_compressed());
        check_encode(&payload)
    }

    /// The secp256k1 private key.
    pub fn ec_private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    /// The secp256k1 public key.
    pub fn ec_pub_key(&self) -> PublicKey {
        self.private_key.pub_key()
    }

    /// The 32-byte chain code.
    pub fn chain_code(&self) -> &[u8; CHAIN_CODE_LEN] {
        &self.chain_code
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn parent_fingerprint(&self) -> [u8; 4] {
        self.parent_fingerprint
    }

    pub fn child_number(&self) -> u32 {
        self.child_number
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// First four bytes of Hash160 of the compressed public key.
    pub fn fingerprint(&self) -> [u8; 4] {
        let digest = hash160(&self.ec_pub_key().to_compressed());
        let mut out = [0u8; 4];
        out.copy_from_slice(&digest[..4]);
        out
    }

    /// version ‖ depth ‖ parent fingerprint ‖ child number ‖ chain code
    fn header(&self, version: [u8; 4]) -> Vec<u8> {
        let mut out = Vec::with_capacity(SERIALIZED_LEN);
        out.extend_from_slice(&version);
        out.push(self.depth);
        out.extend_from_slice(&self.parent_fingerprint);
        out.extend_from_slice(&self.child_number.to_be_bytes());
        out.extend_from_slice(&self.chain_code);
        out
    }
}
