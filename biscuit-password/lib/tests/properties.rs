use biscuit_password::{Argon2Variant, HashContext, HashParameters, PasswordHash};
use proptest::prelude::*;

fn variant() -> impl Strategy<Value = Argon2Variant> {
    prop_oneof![
        Just(Argon2Variant::D),
        Just(Argon2Variant::I),
        Just(Argon2Variant::Id),
    ]
}

fn params() -> impl Strategy<Value = HashParameters> {
    (8usize..=32, 4usize..=64, 1u32..=2).prop_map(|(salt, hash, lanes)| {
        HashParameters::default()
            .with_salt_length(salt)
            .with_hash_length(hash)
            .with_parallelism(lanes)
            .with_iterations(1)
            .with_memory_kib(8 * lanes)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_fresh_salt_makes_derivations_unequal(
        password in proptest::collection::vec(any::<u8>(), 0..48),
        variant in variant(),
        params in params(),
    ) {
        let ctx = HashContext::new();
        let a = PasswordHash::derive(variant, &password, &params, &ctx).unwrap();
        let b = PasswordHash::derive(variant, &password, &params, &ctx).unwrap();
        prop_assert_ne!(a, b);
    }

    #[test]
    fn prop_reconstruction_round_trips(
        password in proptest::collection::vec(any::<u8>(), 0..48),
        variant in variant(),
        params in params(),
    ) {
        let created = PasswordHash::derive(variant, &password, &params, &HashContext::new()).unwrap();
        prop_assert_eq!(created.len(), params.salt_length + params.hash_length);

        let restored = PasswordHash::from_bytes(created.as_bytes().to_vec(), params.salt_length).unwrap();
        prop_assert_eq!(restored.salt(), created.salt());
        prop_assert_eq!(restored.hash(), created.hash());
        prop_assert_eq!(restored, created);
    }

    #[test]
    fn prop_altered_password_fails_verification(
        password in proptest::collection::vec(any::<u8>(), 1..32),
        index in any::<prop::sample::Index>(),
        flip in 1u8..=255,
        variant in variant(),
    ) {
        let params = HashParameters::default()
            .with_hash_length(16)
            .with_parallelism(1)
            .with_iterations(1)
            .with_memory_kib(8);
        let ctx = HashContext::new();
        let stored = PasswordHash::derive(variant, &password, &params, &ctx).unwrap();

        let mut altered = password.clone();
        let i = index.index(altered.len());
        altered[i] ^= flip;

        prop_assert!(stored.verify(variant, &password, &params, &ctx).unwrap());
        prop_assert!(!stored.verify(variant, &altered, &params, &ctx).unwrap());
    }

    #[test]
    fn prop_equality_is_content_based(
        bytes in proptest::collection::vec(any::<u8>(), 2..64),
        split_a in any::<prop::sample::Index>(),
        split_b in any::<prop::sample::Index>(),
    ) {
        // Splits in 1..len so every hash keeps at least one byte.
        let a_split = 1 + split_a.index(bytes.len() - 1);
        let b_split = 1 + split_b.index(bytes.len() - 1);
        let a = PasswordHash::from_bytes(bytes.clone(), a_split).unwrap();
        let b = PasswordHash::from_bytes(bytes.clone(), b_split).unwrap();
        let c = PasswordHash::from_bytes(bytes, a_split).unwrap();

        prop_assert!(a.constant_time_eq(&a));
        prop_assert_eq!(a == b, b == a);
        prop_assert!(a == b && b == c && a == c);
    }
}
