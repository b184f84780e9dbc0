//! The `PasswordHash` value type.
//!
//! A [`PasswordHash`] is one buffer laid out as `salt || hash`. The split
//! point is not encoded in the buffer, so callers persisting the raw bytes
//! must also record the salt length (or use [`StoredHash`](crate::StoredHash),
//! which records it for them).
//!
//! ## Verification
//!
//! Checking a candidate password always recomputes over the *stored* salt
//! and compares full buffers in constant time:
//!
//! ```rust
//! use biscuit_password::{Argon2Variant, HashContext, HashParameters, PasswordHash};
//!
//! let params = HashParameters::default()
//!     .with_hash_length(32)
//!     .with_parallelism(1)
//!     .with_iterations(1)
//!     .with_memory_kib(64);
//! let ctx = HashContext::new();
//!
//! let created = PasswordHash::derive(Argon2Variant::Id, b"s3cret", &params, &ctx).unwrap();
//! let stored = created.as_bytes().to_vec();
//!
//! let loaded = PasswordHash::from_bytes(stored, params.salt_length).unwrap();
//! assert!(loaded.verify(Argon2Variant::Id, b"s3cret", &params, &ctx).unwrap());
//! assert!(!loaded.verify(Argon2Variant::Id, b"s3creT", &params, &ctx).unwrap());
//! ```

use std::fmt;

use subtle::ConstantTimeEq;
use tracing::debug;

use crate::error::{PasswordHashError, Result};
use crate::kdf::{Argon2Kdf, HashContext, Kdf};
use crate::params::HashParameters;
use crate::random::{OsRandom, SecureRandom};
use crate::variant::Argon2Variant;

/// An immutable salted Argon2 hash: `salt || derived hash` in one buffer.
#[derive(Clone)]
pub struct PasswordHash {
    bytes: Vec<u8>,
    salt_length: usize,
    hash_length: usize,
}

impl PasswordHash {
    /// Hashes `password` with Argon2d, default parameters, and no context.
    ///
    /// ## Errors
    ///
    /// See [`PasswordHash::derive`].
    pub fn argon2d(password: &[u8]) -> Result<Self> {
        Self::derive(
            Argon2Variant::D,
            password,
            &HashParameters::default(),
            &HashContext::new(),
        )
    }

    /// Hashes `password` with Argon2i, default parameters, and no context.
    ///
    /// ## Errors
    ///
    /// See [`PasswordHash::derive`].
    pub fn argon2i(password: &[u8]) -> Result<Self> {
        Self::derive(
            Argon2Variant::I,
            password,
            &HashParameters::default(),
            &HashContext::new(),
        )
    }

    /// Hashes `password` with Argon2id, default parameters, and no context.
    ///
    /// ## Errors
    ///
    /// See [`PasswordHash::derive`].
    pub fn argon2id(password: &[u8]) -> Result<Self> {
        Self::derive(
            Argon2Variant::Id,
            password,
            &HashParameters::default(),
            &HashContext::new(),
        )
    }

    /// Hashes `password` under a fresh salt from the OS random source.
    ///
    /// Two calls with identical inputs return different values because the
    /// salts differ. An empty password is valid input.
    ///
    /// ## Errors
    ///
    /// - [`PasswordHashError::InvalidParameters`] if `params` fails validation
    /// - [`PasswordHashError::RandomSourceUnavailable`] if no salt can be drawn
    /// - [`PasswordHashError::DerivationFailed`] if Argon2 rejects the inputs
    pub fn derive(
        variant: Argon2Variant,
        password: &[u8],
        params: &HashParameters,
        context: &HashContext<'_>,
    ) -> Result<Self> {
        Self::derive_with(variant, password, params, context, &mut OsRandom, &Argon2Kdf)
    }

    /// Like [`PasswordHash::derive`] with explicit randomness and derivation
    /// capabilities.
    ///
    /// Parameters are validated before any entropy is consumed.
    ///
    /// ## Errors
    ///
    /// See [`PasswordHash::derive`].
    pub fn derive_with<R, K>(
        variant: Argon2Variant,
        password: &[u8],
        params: &HashParameters,
        context: &HashContext<'_>,
        rng: &mut R,
        kdf: &K,
    ) -> Result<Self>
    where
        R: SecureRandom + ?Sized,
        K: Kdf + ?Sized,
    {
        params.validate()?;

        let mut bytes = vec![0u8; params.output_length()];
        let (salt, hash) = bytes.split_at_mut(params.salt_length);
        rng.fill(salt)?;
        kdf.derive(variant, password, salt, params, context, hash)?;

        Ok(Self {
            bytes,
            salt_length: params.salt_length,
            hash_length: params.hash_length,
        })
    }

    /// Recomputes a hash of `password` over an existing `salt`.
    ///
    /// This is the recomputation step of verification. `params.salt_length`
    /// is ignored in favour of `salt.len()`.
    ///
    /// ## Errors
    ///
    /// - [`PasswordHashError::InvalidParameters`] if `params` (with the
    ///   salt's length) fails validation
    /// - [`PasswordHashError::DerivationFailed`] if Argon2 rejects the inputs
    pub fn with_salt<K>(
        variant: Argon2Variant,
        password: &[u8],
        salt: &[u8],
        params: &HashParameters,
        context: &HashContext<'_>,
        kdf: &K,
    ) -> Result<Self>
    where
        K: Kdf + ?Sized,
    {
        let params = params.with_salt_length(salt.len());
        params.validate()?;

        let mut bytes = Vec::with_capacity(params.output_length());
        bytes.extend_from_slice(salt);
        bytes.resize(params.output_length(), 0);

        let (salt, hash) = bytes.split_at_mut(params.salt_length);
        kdf.derive(variant, password, salt, &params, context, hash)?;

        Ok(Self {
            bytes,
            salt_length: params.salt_length,
            hash_length: params.hash_length,
        })
    }

    /// Rebuilds a hash from stored `salt || hash` bytes.
    ///
    /// No derivation happens; the bytes are wrapped unchanged.
    ///
    /// ## Errors
    ///
    /// Returns [`PasswordHashError::InvalidEncoding`] if `salt_length` is
    /// zero or leaves no room for a hash.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>, salt_length: usize) -> Result<Self> {
        let bytes = bytes.into();

        if salt_length == 0 {
            return Err(PasswordHashError::InvalidEncoding(
                "salt length must be greater than zero".into(),
            ));
        }
        if salt_length >= bytes.len() {
            return Err(PasswordHashError::InvalidEncoding(format!(
                "salt length {salt_length} leaves no hash in a {}-byte buffer",
                bytes.len()
            )));
        }

        let hash_length = bytes.len() - salt_length;
        Ok(Self {
            bytes,
            salt_length,
            hash_length,
        })
    }

    pub fn salt(&self) -> &[u8] {
        &self.bytes[..self.salt_length]
    }

    pub fn hash(&self) -> &[u8] {
        &self.bytes[self.salt_length..]
    }

    /// The full `salt || hash` buffer, ready to persist.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn salt_length(&self) -> usize {
        self.salt_length
    }

    pub fn hash_length(&self) -> usize {
        self.hash_length
    }

    /// Total buffer length, always `salt_length + hash_length`.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false; a constructed hash holds at least one salt and one hash byte.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Compares two hashes over their full buffers in constant time.
    ///
    /// The running time depends only on the buffer length, never on the
    /// position of the first differing byte. Buffers of different length
    /// compare unequal. Salt and hash must both match; the recorded split
    /// point plays no part.
    pub fn constant_time_eq(&self, other: &Self) -> bool {
        self.bytes.as_slice().ct_eq(other.bytes.as_slice()).into()
    }

    /// Checks `candidate` against this stored hash using Argon2.
    ///
    /// `params` must carry the cost fields used when the hash was created.
    /// Its length fields are ignored: the stored salt and hash lengths are used.
    ///
    /// ## Errors
    ///
    /// Propagates [`PasswordHashError::InvalidParameters`] and
    /// [`PasswordHashError::DerivationFailed`]. A wrong password is `Ok(false)`.
    pub fn verify(
        &self,
        variant: Argon2Variant,
        candidate: &[u8],
        params: &HashParameters,
        context: &HashContext<'_>,
    ) -> Result<bool> {
        self.verify_with(variant, candidate, params, context, &Argon2Kdf)
    }

    /// Like [`PasswordHash::verify`] with an explicit derivation capability.
    ///
    /// ## Errors
    ///
    /// See [`PasswordHash::verify`].
    pub fn verify_with<K>(
        &self,
        variant: Argon2Variant,
        candidate: &[u8],
        params: &HashParameters,
        context: &HashContext<'_>,
        kdf: &K,
    ) -> Result<bool>
    where
        K: Kdf + ?Sized,
    {
        let params = params.with_hash_length(self.hash_length);
        let recomputed = Self::with_salt(variant, candidate, self.salt(), &params, context, kdf)?;
        let matched = self.constant_time_eq(&recomputed);

        debug!(variant = %variant, matched, "verified password hash");
        Ok(matched)
    }
}

impl PartialEq for PasswordHash {
    /// Delegates to [`PasswordHash::constant_time_eq`].
    fn eq(&self, other: &Self) -> bool {
        self.constant_time_eq(other)
    }
}

impl Eq for PasswordHash {}

impl AsRef<[u8]> for PasswordHash {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordHash")
            .field("salt_length", &self.salt_length)
            .field("hash_length", &self.hash_length)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::random::SeededRandom;

    fn cheap() -> HashParameters {
        HashParameters::default()
            .with_hash_length(32)
            .with_parallelism(1)
            .with_iterations(1)
            .with_memory_kib(64)
    }

    /// Stand-in derivation: XORs password, salt, and variant tag into the output.
    #[derive(Default)]
    struct XorKdf {
        calls: AtomicUsize,
    }

    impl Kdf for XorKdf {
        fn derive(
            &self,
            variant: Argon2Variant,
            password: &[u8],
            salt: &[u8],
            _params: &HashParameters,
            _context: &HashContext<'_>,
            out: &mut [u8],
        ) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            for (i, byte) in out.iter_mut().enumerate() {
                let p = password.get(i % password.len().max(1)).copied().unwrap_or(0);
                *byte = p ^ salt[i % salt.len()] ^ variant.tag();
            }
            Ok(())
        }
    }

    struct BrokenRandom;

    impl SecureRandom for BrokenRandom {
        fn fill(&mut self, _buf: &mut [u8]) -> Result<()> {
            Err(PasswordHashError::RandomSourceUnavailable(
                "entropy pool closed".into(),
            ))
        }
    }

    #[test]
    fn test_layout_is_salt_then_hash() {
        let mut rng = SeededRandom::new(11);
        let mut expected_salt = [0u8; 16];
        SeededRandom::new(11).fill(&mut expected_salt).unwrap();

        let hash = PasswordHash::derive_with(
            Argon2Variant::Id,
            b"pw",
            &cheap(),
            &HashContext::new(),
            &mut rng,
            &XorKdf::default(),
        )
        .unwrap();

        assert_eq!(hash.len(), 48);
        assert_eq!(hash.salt(), &expected_salt);
        assert_eq!(hash.hash().len(), 32);
        assert_eq!(&hash.as_bytes()[16..], hash.hash());
    }

    #[test]
    fn test_invalid_params_consume_no_entropy() {
        let kdf = XorKdf::default();
        let err = PasswordHash::derive_with(
            Argon2Variant::Id,
            b"pw",
            &cheap().with_iterations(0),
            &HashContext::new(),
            &mut BrokenRandom,
            &kdf,
        )
        .unwrap_err();

        assert!(matches!(err, PasswordHashError::InvalidParameters(_)));
        assert_eq!(kdf.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_random_failure_aborts_before_derivation() {
        let kdf = XorKdf::default();
        let err = PasswordHash::derive_with(
            Argon2Variant::Id,
            b"pw",
            &cheap(),
            &HashContext::new(),
            &mut BrokenRandom,
            &kdf,
        )
        .unwrap_err();

        assert!(matches!(err, PasswordHashError::RandomSourceUnavailable(_)));
        assert_eq!(kdf.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_seeded_derivation_is_reproducible() {
        let make = || {
            PasswordHash::derive_with(
                Argon2Variant::I,
                b"pw",
                &cheap(),
                &HashContext::new(),
                &mut SeededRandom::new(5),
                &Argon2Kdf,
            )
            .unwrap()
        };
        assert_eq!(make(), make());
    }

    #[test]
    fn test_from_bytes_splits_at_salt_length() {
        let bytes: Vec<u8> = (0u8..20).collect();
        let hash = PasswordHash::from_bytes(bytes.clone(), 8).unwrap();
        assert_eq!(hash.salt(), &bytes[..8]);
        assert_eq!(hash.hash(), &bytes[8..]);
        assert_eq!(hash.salt_length(), 8);
        assert_eq!(hash.hash_length(), 12);
        assert_eq!(hash.into_bytes(), bytes);
    }

    #[test]
    fn test_from_bytes_rejects_impossible_splits() {
        let bytes = vec![1u8; 16];
        for salt_length in [0, 16, 17, 100] {
            let err = PasswordHash::from_bytes(bytes.clone(), salt_length).unwrap_err();
            assert!(
                matches!(err, PasswordHashError::InvalidEncoding(_)),
                "salt_length {salt_length}"
            );
        }
        assert!(PasswordHash::from_bytes(bytes, 15).is_ok());
    }

    #[test]
    fn test_equality_ignores_split_point() {
        let bytes = vec![9u8; 24];
        let a = PasswordHash::from_bytes(bytes.clone(), 8).unwrap();
        let b = PasswordHash::from_bytes(bytes, 16).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_equality_detects_any_byte_difference() {
        let base: Vec<u8> = (0u8..32).collect();
        let original = PasswordHash::from_bytes(base.clone(), 16).unwrap();
        for i in [0, 15, 16, 31] {
            let mut altered = base.clone();
            altered[i] ^= 0x80;
            let other = PasswordHash::from_bytes(altered, 16).unwrap();
            assert!(!original.constant_time_eq(&other), "byte {i}");
        }
    }

    #[test]
    fn test_different_lengths_are_unequal() {
        let a = PasswordHash::from_bytes(vec![1u8; 20], 8).unwrap();
        let b = PasswordHash::from_bytes(vec![1u8; 21], 8).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_with_salt_reuses_given_salt() {
        let salt = b"0123456789abcdef0123";
        let hash = PasswordHash::with_salt(
            Argon2Variant::Id,
            b"pw",
            salt,
            &cheap(),
            &HashContext::new(),
            &Argon2Kdf,
        )
        .unwrap();
        assert_eq!(hash.salt(), salt);
        assert_eq!(hash.salt_length(), 20);
        assert_eq!(hash.hash_length(), 32);
    }

    #[test]
    fn test_verify_uses_stored_lengths() {
        let params = cheap().with_hash_length(24);
        let ctx = HashContext::new();
        let created = PasswordHash::derive(Argon2Variant::D, b"pw", &params, &ctx).unwrap();

        // Callers may pass a policy whose hash_length has since changed.
        let current = params.with_hash_length(64);
        assert!(created.verify(Argon2Variant::D, b"pw", &current, &ctx).unwrap());
    }

    #[test]
    fn test_verify_fails_for_wrong_variant() {
        let ctx = HashContext::new();
        let created = PasswordHash::derive(Argon2Variant::D, b"pw", &cheap(), &ctx).unwrap();
        assert!(!created.verify(Argon2Variant::Id, b"pw", &cheap(), &ctx).unwrap());
    }

    #[test]
    fn test_verify_requires_same_context() {
        let bound = HashContext::new()
            .with_associated_data(b"user-1")
            .with_known_secret(b"pepper");
        let created = PasswordHash::derive(Argon2Variant::Id, b"pw", &cheap(), &bound).unwrap();

        assert!(created.verify(Argon2Variant::Id, b"pw", &cheap(), &bound).unwrap());
        assert!(
            !created
                .verify(Argon2Variant::Id, b"pw", &cheap(), &HashContext::new())
                .unwrap()
        );
        let other_user = HashContext::new()
            .with_associated_data(b"user-2")
            .with_known_secret(b"pepper");
        assert!(
            !created
                .verify(Argon2Variant::Id, b"pw", &cheap(), &other_user)
                .unwrap()
        );
    }

    #[test]
    fn test_known_secret_is_not_stored() {
        let secret = b"pepper-pepper-pepper";
        let ctx = HashContext::new().with_known_secret(secret);
        let created = PasswordHash::derive(Argon2Variant::Id, b"pw", &cheap(), &ctx).unwrap();
        assert!(
            !created
                .as_bytes()
                .windows(secret.len())
                .any(|w| w == secret)
        );
    }

    #[test]
    fn test_debug_hides_bytes() {
        let hash = PasswordHash::from_bytes(vec![0xAB; 24], 8).unwrap();
        let rendered = format!("{hash:?}");
        assert!(rendered.contains("salt_length: 8"));
        assert!(rendered.contains("hash_length: 16"));
        assert!(!rendered.contains("171"));
    }

    #[test]
    #[tracing_test::traced_test]
    fn test_derivation_logs_parameters_not_password() {
        let _ = PasswordHash::derive(
            Argon2Variant::Id,
            b"correct horse battery staple",
            &cheap(),
            &HashContext::new(),
        )
        .unwrap();

        assert!(logs_contain("deriving argon2 hash"));
        assert!(logs_contain("memory_kib=64"));
        assert!(!logs_contain("correct horse"));
    }
}
