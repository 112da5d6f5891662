//! Labeled HKDF-SHA256 (RFC 9180 §4).
//!
//! Every extract and expand is prefixed with `"HPKE-v1" ‖ suite_id ‖ label`
//! so that keys derived for one purpose can never be mistaken for keys
//! derived for another. The byte layout must match other implementations
//! exactly: a deviation yields different keys, not an error.

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::HpkeError;

/// Version prefix mixed into every labeled input.
const VERSION_LABEL: &[u8] = b"HPKE-v1";

/// Output size of HKDF-SHA256 extract.
pub const EXTRACT_LEN: usize = 32;

/// `HKDF-Extract(salt, "HPKE-v1" ‖ suite_id ‖ label ‖ ikm)`
pub fn labeled_extract(
    salt: &[u8],
    label: &[u8],
    ikm: &[u8],
    suite_id: &[u8],
) -> Zeroizing<[u8; EXTRACT_LEN]> {
    let mut labeled_ikm = Zeroizing::new(Vec::with_capacity(
        VERSION_LABEL.len() + suite_id.len() + label.len() + ikm.len(),
    ));
    labeled_ikm.extend_from_slice(VERSION_LABEL);
    labeled_ikm.extend_from_slice(suite_id);
    labeled_ikm.extend_from_slice(label);
    labeled_ikm.extend_from_slice(ikm);

    let (prk, _) = Hkdf::<Sha256>::extract(Some(salt), &labeled_ikm);
    let mut out = Zeroizing::new([0u8; EXTRACT_LEN]);
    out.copy_from_slice(&prk);
    out
}

/// `HKDF-Expand(prk, I2OSP(len, 2) ‖ "HPKE-v1" ‖ suite_id ‖ label ‖ info, len)`
pub fn labeled_expand(
    prk: &[u8],
    label: &[u8],
    info: &[u8],
    len: u16,
    suite_id: &[u8],
) -> Result<Zeroizing<Vec<u8>>, HpkeError> {
    let mut labeled_info =
        Vec::with_capacity(2 + VERSION_LABEL.len() + suite_id.len() + label.len() + info.len());
    labeled_info.extend_from_slice(&len.to_be_bytes());
    labeled_info.extend_from_slice(VERSION_LABEL);
    labeled_info.extend_from_slice(suite_id);
    labeled_info.extend_from_slice(label);
    labeled_info.extend_from_slice(info);

    let hk = Hkdf::<Sha256>::from_prk(prk)
        .map_err(|e| HpkeError::KeyDerivation(e.to_string()))?;
    let mut okm = Zeroizing::new(vec![0u8; usize::from(len)]);
    hk.expand(&labeled_info, &mut okm)
        .map_err(|e| HpkeError::KeyDerivation(e.to_string()))?;
    Ok(okm)
}
