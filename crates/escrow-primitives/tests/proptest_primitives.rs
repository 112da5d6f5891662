use proptest::prelude::*;

use escrow_primitives::ec::private_key::PrivateKey;
use escrow_primitives::ec::public_key::PublicKey;
use escrow_primitives::hd::{ExtendedPrivateKey, Network};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn point_sub_is_inverse_of_add(
        a_seed in prop::array::uniform32(any::<u8>()),
        b_seed in prop::array::uniform32(any::<u8>()),
    ) {
        // Not all 32-byte arrays are valid private keys (must be < curve order, nonzero).
        if let (Ok(a), Ok(b)) = (PrivateKey::from_bytes(&a_seed), PrivateKey::from_bytes(&b_seed)) {
            let (pa, pb) = (a.pub_key(), b.pub_key());
            prop_assert!(!pb.has_zero_y());
            if pa != pb {
                let diff = pa.sub(&pb).unwrap();
                prop_assert_eq!(diff.add(&pb).unwrap(), pa);
            }
        }
    }

    #[test]
    fn additive_split_recombines_on_the_curve(
        key_seed in prop::array::uniform32(any::<u8>()),
        share_seed in prop::array::uniform32(any::<u8>()),
    ) {
        if let (Ok(key), Ok(first)) = (PrivateKey::from_bytes(&key_seed), PrivateKey::from_bytes(&share_seed)) {
            if key != first {
                let second = key.sub(&first).unwrap();
                let recombined = first.pub_key().add(&second.pub_key()).unwrap();
                prop_assert_eq!(recombined, key.pub_key());
                prop_assert_eq!(first.add(&second).unwrap(), key);
            }
        }
    }

    #[test]
    fn sec1_encodings_roundtrip(seed in prop::array::uniform32(any::<u8>())) {
        if let Ok(key) = PrivateKey::from_bytes(&seed) {
            let pub_key = key.pub_key();
            prop_assert_eq!(PublicKey::from_bytes(&pub_key.to_uncompressed()).unwrap(), pub_key);
            prop_assert_eq!(PublicKey::from_bytes(&pub_key.to_compressed()).unwrap(), pub_key);
        }
    }

    #[test]
    fn extended_key_base58_roundtrip(
        seed in prop::array::uniform32(any::<u8>()),
        chain_code in prop::array::uniform32(any::<u8>()),
    ) {
        if let Ok(key) = PrivateKey::from_bytes(&seed) {
            let xprv = ExtendedPrivateKey::new_root(key, &chain_code, Network::Testnet).unwrap();
            let parsed = ExtendedPrivateKey::from_base58(&xprv.to_base58()).unwrap();
            prop_assert_eq!(parsed, xprv);
        }
    }
}
