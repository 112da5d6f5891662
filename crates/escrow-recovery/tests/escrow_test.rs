use std::sync::Arc;

use base64::Engine;

use escrow_hpke::{open, SequenceKeyGenerator};
use escrow_primitives::ec::{PrivateKey, PublicKey};
use escrow_primitives::hd::{ExtendedPrivateKey, Network};
use escrow_recovery::labels::{MUUN_FIRST_HALF_TO_CLIENT, USER_FIRST_HALF_TO_RECOVERY_CODE};
use escrow_recovery::{
    EscrowConfig, ErrorKind, FnVerifier, KeyBearer, ProofRequest, RecoveryCode, RecoveryEscrow,
    RecoveryKeyBundle, TokenVerifier, VerifiableMuunKey,
};

const TEST_PROOF: &str = "test-mode-proof";
const CHAIN_CODE: [u8; 32] = [0x5a; 32];

fn user_key() -> ExtendedPrivateKey {
    ExtendedPrivateKey::new_root(PrivateKey::generate().unwrap(), &CHAIN_CODE, Network::Mainnet)
        .unwrap()
}

fn b64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

fn raw(encoded: &str) -> Vec<u8> {
    base64::engine::general_purpose::STANDARD.decode(encoded).unwrap()
}

/// Party keys for the server-split flow.
struct Parties {
    muun_key: PrivateKey,
    client_key: PrivateKey,
    recovery_code_key: PrivateKey,
}

impl Parties {
    fn new() -> Self {
        Parties {
            muun_key: PrivateKey::generate().unwrap(),
            client_key: PrivateKey::generate().unwrap(),
            recovery_code_key: PrivateKey::generate().unwrap(),
        }
    }

    fn recovery_code_pub(&self) -> PublicKey {
        self.recovery_code_key.pub_key()
    }

    fn verifiable(&self, escrow: &RecoveryEscrow, proof: Option<&str>) -> VerifiableMuunKey {
        escrow
            .encrypt_muun_key(
                &self.muun_key,
                &self.client_key.pub_key(),
                &self.recovery_code_pub(),
                proof.map(str::to_string),
            )
            .unwrap()
    }

    fn verify(
        &self,
        escrow: &RecoveryEscrow,
        key: &VerifiableMuunKey,
    ) -> escrow_recovery::VerifiedMuunKey {
        escrow
            .verify_muun_key(
                key,
                &self.muun_key.pub_key(),
                &CHAIN_CODE,
                &self.client_key,
                &self.recovery_code_pub(),
            )
            .unwrap()
    }
}

#[test]
fn test_user_key_survives_escrow() {
    let escrow = RecoveryEscrow::default();
    let code = RecoveryCode::generate().unwrap();
    let recovery_code_key = code.to_private_key(None).unwrap();
    let key = user_key();

    let encoded = escrow.encrypt_user_key(&key, &recovery_code_key.pub_key()).unwrap();
    let bundle = RecoveryKeyBundle::decode(&encoded).unwrap();
    assert_eq!(bundle.bearer(), KeyBearer::User);

    let recovered = escrow.decrypt_extended_key(&recovery_code_key, &encoded).unwrap();
    assert_eq!(recovered.ec_pub_key(), key.ec_pub_key());
    assert_eq!(recovered.chain_code(), key.chain_code());
    assert_eq!(recovered.depth(), 0);
}

/// The halves inside a bundle add up to the original public key.
#[test]
fn test_bundle_halves_recombine_on_the_curve() {
    let recovery_code_key = PrivateKey::generate().unwrap();
    let key = user_key();
    let encoded = RecoveryEscrow::default()
        .encrypt_user_key(&key, &recovery_code_key.pub_key())
        .unwrap();
    let bundle = RecoveryKeyBundle::decode(&encoded).unwrap();

    let first = open(
        bundle.first_message(),
        &recovery_code_key,
        KeyBearer::User.first_half_label().as_bytes(),
        b"",
    )
    .unwrap();
    let second = open(
        bundle.second_message(),
        &recovery_code_key,
        KeyBearer::User.second_half_label().as_bytes(),
        b"",
    )
    .unwrap();

    let first_pub = PrivateKey::from_bytes(&first[..32]).unwrap().pub_key();
    let second_pub = PrivateKey::from_bytes(&second[..]).unwrap().pub_key();
    assert_eq!(first_pub.add(&second_pub).unwrap(), key.ec_pub_key());
    assert_eq!(&first[32..], &CHAIN_CODE[..]);
}

/// Every byte of either ciphertext is covered by authentication.
#[test]
fn test_tampering_either_half_is_detected() {
    let recovery_code_key = PrivateKey::generate().unwrap();
    let escrow = RecoveryEscrow::default();
    let bytes = raw(&escrow.encrypt_user_key(&user_key(), &recovery_code_key.pub_key()).unwrap());

    // Each ciphertext follows its 65-byte encapsulated key.
    let first_ciphertext = 67..147;
    let second_ciphertext = 212..260;
    for index in first_ciphertext.step_by(7).chain(second_ciphertext.step_by(7)) {
        let mut tampered = bytes.clone();
        tampered[index] ^= 0x80;
        let err = escrow
            .decrypt_extended_key(&recovery_code_key, &b64(&tampered))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Crypto, "byte {}: {}", index, err);
    }
}

/// Relabeling a user bundle as a Muun bundle selects the wrong labels.
#[test]
fn test_wrong_bearer_labels_fail() {
    let recovery_code_key = PrivateKey::generate().unwrap();
    let escrow = RecoveryEscrow::default();
    let mut bytes =
        raw(&escrow.encrypt_user_key(&user_key(), &recovery_code_key.pub_key()).unwrap());
    bytes[1] = KeyBearer::Muun.as_byte();

    let err = escrow
        .decrypt_extended_key(&recovery_code_key, &b64(&bytes))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Crypto);
    assert!(err.to_string().contains("/2/1/recovery-code"), "got: {}", err);
}

#[test]
fn test_wrong_label_fails_to_open() {
    let recovery_code_key = PrivateKey::generate().unwrap();
    let encoded = RecoveryEscrow::default()
        .encrypt_user_key(&user_key(), &recovery_code_key.pub_key())
        .unwrap();
    let bundle = RecoveryKeyBundle::decode(&encoded).unwrap();
    assert!(open(
        bundle.first_message(),
        &recovery_code_key,
        MUUN_FIRST_HALF_TO_CLIENT.as_bytes(),
        b""
    )
    .is_err());
    assert!(open(
        bundle.first_message(),
        &recovery_code_key,
        USER_FIRST_HALF_TO_RECOVERY_CODE.as_bytes(),
        b""
    )
    .is_ok());
}

#[test]
fn test_older_bundle_version_is_rejected() {
    let err = RecoveryEscrow::default()
        .decrypt_extended_key(&PrivateKey::generate().unwrap(), &b64(&[2, 0, 1]))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
    assert!(err.to_string().contains("v2"), "got: {}", err);
}

#[test]
fn test_trailing_bytes_are_rejected() {
    let recovery_code_key = PrivateKey::generate().unwrap();
    let escrow = RecoveryEscrow::default();
    let mut bytes =
        raw(&escrow.encrypt_user_key(&user_key(), &recovery_code_key.pub_key()).unwrap());
    bytes.extend_from_slice(&[0, 0, 0]);

    let err = escrow
        .decrypt_extended_key(&recovery_code_key, &b64(&bytes))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
    assert!(err.to_string().contains("longer than expected"), "got: {}", err);
}

/// Pinned randomness makes bundle creation reproducible.
#[test]
fn test_pinned_key_generator_is_deterministic() {
    let fixed: Vec<PrivateKey> = (1u8..=3)
        .map(|i| PrivateKey::from_bytes(&[i; 32]).unwrap())
        .collect();
    let recovery_code_pub = PrivateKey::generate().unwrap().pub_key();
    let key = user_key();

    let encode = || {
        RecoveryEscrow::default()
            .with_key_generator(Arc::new(SequenceKeyGenerator::new(fixed.clone())))
            .encrypt_user_key(&key, &recovery_code_pub)
            .unwrap()
    };
    assert_eq!(encode(), encode());
}

#[test]
fn test_verify_without_proof_is_unverified_but_usable() {
    let parties = Parties::new();
    let escrow = RecoveryEscrow::default().with_verifier(Arc::new(TokenVerifier::new(TEST_PROOF)));
    let key = parties.verifiable(&escrow, None);

    let result = parties.verify(&escrow, &key);
    assert!(!result.verified);
    assert!(!result.encrypted_muun_key.is_empty());

    let bundle = RecoveryKeyBundle::decode(&result.encrypted_muun_key).unwrap();
    assert_eq!(bundle.bearer(), KeyBearer::Muun);

    let recovered = escrow
        .decrypt_extended_key(&parties.recovery_code_key, &result.encrypted_muun_key)
        .unwrap();
    assert_eq!(recovered.ec_pub_key(), parties.muun_key.pub_key());
    assert_eq!(recovered.chain_code(), &CHAIN_CODE);
}

#[test]
fn test_verify_with_accepted_proof() {
    let parties = Parties::new();
    let escrow = RecoveryEscrow::default().with_verifier(Arc::new(TokenVerifier::new(TEST_PROOF)));
    let key = parties.verifiable(&escrow, Some(TEST_PROOF));

    let result = parties.verify(&escrow, &key);
    assert!(result.verified);
    let recovered = escrow
        .decrypt_extended_key(&parties.recovery_code_key, &result.encrypted_muun_key)
        .unwrap();
    assert_eq!(recovered.ec_pub_key(), parties.muun_key.pub_key());
}

#[test]
fn test_verify_with_rejected_proof_still_produces_bundle() {
    let parties = Parties::new();
    let escrow = RecoveryEscrow::default().with_verifier(Arc::new(TokenVerifier::new(TEST_PROOF)));
    let key = parties.verifiable(&escrow, Some("forged"));

    let result = parties.verify(&escrow, &key);
    assert!(!result.verified);
    assert!(escrow
        .decrypt_extended_key(&parties.recovery_code_key, &result.encrypted_muun_key)
        .is_ok());
}

/// The verifier sees the public key of the recovery-code half.
#[test]
fn test_verifier_receives_second_half_public_key() {
    let parties = Parties::new();
    let recovery_code_pub = parties.recovery_code_pub();
    let escrow = RecoveryEscrow::default();
    let key = parties.verifiable(&escrow, Some("proof"));
    let second_message = key.second_half_key_encrypted_to_recovery_code().clone();
    let recovery_code_key = parties.recovery_code_key.clone();

    let verifier = FnVerifier::new(move |request: &ProofRequest<'_>| {
        if request.recovery_code_pub != &recovery_code_pub
            || request.encapsulated_key != second_message.encapsulated_key()
        {
            return Err("wrong request".to_string());
        }
        let half = open(
            &second_message,
            &recovery_code_key,
            KeyBearer::Muun.second_half_label().as_bytes(),
            b"",
        )
        .map_err(|e| e.to_string())?;
        let half_pub = PrivateKey::from_bytes(&half[..]).map_err(|e| e.to_string())?.pub_key();
        if &half_pub == request.second_half_pub {
            Ok(())
        } else {
            Err("second half mismatch".to_string())
        }
    });

    let escrow = escrow.with_verifier(Arc::new(verifier));
    assert!(parties.verify(&escrow, &key).verified);
}

#[test]
fn test_panicking_verifier_degrades_to_unverified() {
    let parties = Parties::new();
    let verifier = FnVerifier::new(|_: &ProofRequest<'_>| -> Result<(), String> {
        panic!("verifier crashed")
    });
    let escrow = RecoveryEscrow::default().with_verifier(Arc::new(verifier));
    let key = parties.verifiable(&escrow, Some(TEST_PROOF));
    assert!(!parties.verify(&escrow, &key).verified);
}

#[test]
fn test_disabled_verification_reports_unverified() {
    let parties = Parties::new();
    let config = EscrowConfig {
        verify_proofs: false,
        ..EscrowConfig::default()
    };
    let escrow =
        RecoveryEscrow::new(config).with_verifier(Arc::new(TokenVerifier::new(TEST_PROOF)));
    let key = parties.verifiable(&escrow, Some(TEST_PROOF));
    assert!(!parties.verify(&escrow, &key).verified);
}

/// A client key that cannot open its half is a hard error, not `verified = false`.
#[test]
fn test_verify_with_wrong_client_key_fails() {
    let parties = Parties::new();
    let escrow = RecoveryEscrow::default();
    let key = parties.verifiable(&escrow, None);
    let err = escrow
        .verify_muun_key(
            &key,
            &parties.muun_key.pub_key(),
            &CHAIN_CODE,
            &PrivateKey::generate().unwrap(),
            &parties.recovery_code_pub(),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Crypto);
}

#[test]
fn test_verify_rejects_short_chain_code() {
    let parties = Parties::new();
    let escrow = RecoveryEscrow::default();
    let key = parties.verifiable(&escrow, None);
    let err = escrow
        .verify_muun_key(
            &key,
            &parties.muun_key.pub_key(),
            &CHAIN_CODE[..16],
            &parties.client_key,
            &parties.recovery_code_pub(),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[test]
fn test_verifiable_key_from_hex() {
    let parties = Parties::new();
    let escrow = RecoveryEscrow::default();
    let key = parties.verifiable(&escrow, Some(TEST_PROOF));
    let parsed = VerifiableMuunKey::from_hex(
        &key.first_half_key_encrypted_to_client().to_hex(),
        &key.second_half_key_encrypted_to_recovery_code().to_hex(),
        Some(TEST_PROOF.to_string()),
    )
    .unwrap();
    assert_eq!(parsed, key);
    assert_eq!(parsed.proof(), Some(TEST_PROOF));
}

#[test]
fn test_testnet_config_controls_serialization() {
    let config = EscrowConfig {
        network: Network::Testnet,
        ..EscrowConfig::default()
    };
    let escrow = RecoveryEscrow::new(config);
    let recovery_code_key = PrivateKey::generate().unwrap();
    let encoded = escrow
        .encrypt_user_key(&user_key(), &recovery_code_key.pub_key())
        .unwrap();
    let recovered = escrow.decrypt_extended_key(&recovery_code_key, &encoded).unwrap();
    assert!(recovered.to_base58().starts_with("tprv"));
}
