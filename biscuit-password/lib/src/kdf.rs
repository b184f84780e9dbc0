//! The Argon2 derivation seam.
//!
//! Everything above this module treats the memory-hard mixing function as a
//! collaborator reached through [`Kdf`]. [`Argon2Kdf`] is the production
//! implementation backed by the `argon2` crate.

use std::fmt;

use argon2::{Argon2, AssociatedData, ParamsBuilder, Version};
use tracing::debug;

use crate::error::{PasswordHashError, Result};
use crate::params::HashParameters;
use crate::variant::Argon2Variant;

/// Optional inputs mixed into a derivation besides the password and salt.
///
/// `None` and `Some(&[])` are distinct: an absent value is never handed to
/// the primitive at all.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct HashContext<'a> {
    /// Non-secret context bytes (e.g. a user identifier) binding the hash to
    /// that context. At most 32 bytes for Argon2.
    pub associated_data: Option<&'a [u8]>,
    /// Application-wide secret kept outside the password store. It is fed to
    /// the primitive but never written into any output buffer.
    pub known_secret: Option<&'a [u8]>,
}

impl<'a> HashContext<'a> {
    /// A context with neither associated data nor a known secret.
    pub const fn new() -> Self {
        Self {
            associated_data: None,
            known_secret: None,
        }
    }

    #[must_use]
    pub fn with_associated_data(mut self, data: &'a [u8]) -> Self {
        self.associated_data = Some(data);
        self
    }

    #[must_use]
    pub fn with_known_secret(mut self, secret: &'a [u8]) -> Self {
        self.known_secret = Some(secret);
        self
    }
}

impl fmt::Debug for HashContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashContext")
            .field("associated_data_len", &self.associated_data.map(<[u8]>::len))
            .field("known_secret", &self.known_secret.map(|_| "<redacted>"))
            .finish()
    }
}

/// A memory-hard key derivation function.
///
/// Implementations hold no shared mutable state, so one instance may serve
/// concurrent derivations.
pub trait Kdf: Send + Sync {
    /// Derives `out.len()` bytes from `password` and `salt`.
    ///
    /// The cost fields of `params` are used; `salt_length` and
    /// `hash_length` are already reflected in `salt.len()` and `out.len()`.
    ///
    /// ## Errors
    ///
    /// Returns [`PasswordHashError::DerivationFailed`] if the primitive
    /// rejects any input. Parameters are never adjusted and retried.
    fn derive(
        &self,
        variant: Argon2Variant,
        password: &[u8],
        salt: &[u8],
        params: &HashParameters,
        context: &HashContext<'_>,
        out: &mut [u8],
    ) -> Result<()>;
}

/// Argon2 version 0x13 from the `argon2` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Kdf;

impl Kdf for Argon2Kdf {
    fn derive(
        &self,
        variant: Argon2Variant,
        password: &[u8],
        salt: &[u8],
        params: &HashParameters,
        context: &HashContext<'_>,
        out: &mut [u8],
    ) -> Result<()> {
        debug!(
            variant = %variant,
            memory_kib = params.memory_kib,
            iterations = params.iterations,
            parallelism = params.parallelism,
            salt_len = salt.len(),
            hash_len = out.len(),
            associated_data = context.associated_data.is_some(),
            known_secret = context.known_secret.is_some(),
            "deriving argon2 hash"
        );

        let mut builder = ParamsBuilder::new();
        builder
            .m_cost(params.memory_kib)
            .t_cost(params.iterations)
            .p_cost(params.parallelism)
            .output_len(out.len());

        if let Some(data) = context.associated_data {
            builder.data(AssociatedData::new(data).map_err(derivation_failed)?);
        }

        let argon_params = builder.build().map_err(derivation_failed)?;

        let argon2 = match context.known_secret {
            Some(secret) => {
                Argon2::new_with_secret(secret, variant.algorithm(), Version::V0x13, argon_params)
                    .map_err(derivation_failed)?
            }
            None => Argon2::new(variant.algorithm(), Version::V0x13, argon_params),
        };

        argon2
            .hash_password_into(password, salt, out)
            .map_err(derivation_failed)
    }
}

fn derivation_failed(err: argon2::Error) -> PasswordHashError {
    PasswordHashError::DerivationFailed(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> HashParameters {
        HashParameters::default()
            .with_hash_length(32)
            .with_parallelism(1)
            .with_iterations(1)
            .with_memory_kib(64)
    }

    fn derive(variant: Argon2Variant, context: &HashContext<'_>) -> Result<[u8; 32]> {
        let mut out = [0u8; 32];
        Argon2Kdf.derive(
            variant,
            b"hunter2",
            b"fixed salt bytes",
            &cheap(),
            context,
            &mut out,
        )?;
        Ok(out)
    }

    #[test]
    fn test_same_inputs_are_deterministic() {
        let ctx = HashContext::new();
        assert_eq!(
            derive(Argon2Variant::Id, &ctx).unwrap(),
            derive(Argon2Variant::Id, &ctx).unwrap()
        );
    }

    #[test]
    fn test_variants_produce_different_outputs() {
        let ctx = HashContext::new();
        let d = derive(Argon2Variant::D, &ctx).unwrap();
        let i = derive(Argon2Variant::I, &ctx).unwrap();
        let id = derive(Argon2Variant::Id, &ctx).unwrap();
        assert_ne!(d, i);
        assert_ne!(d, id);
        assert_ne!(i, id);
    }

    #[test]
    fn test_associated_data_changes_output() {
        let plain = derive(Argon2Variant::Id, &HashContext::new()).unwrap();
        let bound = derive(
            Argon2Variant::Id,
            &HashContext::new().with_associated_data(b"user-42"),
        )
        .unwrap();
        assert_ne!(plain, bound);
    }

    #[test]
    fn test_known_secret_changes_output() {
        let plain = derive(Argon2Variant::Id, &HashContext::new()).unwrap();
        let peppered = derive(
            Argon2Variant::Id,
            &HashContext::new().with_known_secret(b"server-side pepper"),
        )
        .unwrap();
        assert_ne!(plain, peppered);
    }

    #[test]
    fn test_oversized_associated_data_fails() {
        let data = [7u8; 64];
        let err = derive(
            Argon2Variant::Id,
            &HashContext::new().with_associated_data(&data),
        )
        .unwrap_err();
        assert!(matches!(err, PasswordHashError::DerivationFailed(_)));
    }

    #[test]
    fn test_short_salt_fails() {
        let mut out = [0u8; 32];
        let err = Argon2Kdf
            .derive(
                Argon2Variant::Id,
                b"pw",
                b"short",
                &cheap(),
                &HashContext::new(),
                &mut out,
            )
            .unwrap_err();
        assert!(matches!(err, PasswordHashError::DerivationFailed(_)));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let ctx = HashContext::new()
            .with_associated_data(b"user-42")
            .with_known_secret(b"do-not-print");
        let rendered = format!("{ctx:?}");
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("do-not-print"));
        assert!(!rendered.contains("user-42"));
    }
}
