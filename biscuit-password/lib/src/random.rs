//! Secure randomness as an injected capability.
//!
//! Salts are drawn through [`SecureRandom`] rather than a hidden global so
//! tests can substitute a reproducible source. Production code uses
//! [`OsRandom`].

use rand::rngs::{OsRng, StdRng};
use rand::{RngCore, SeedableRng};

use crate::error::{PasswordHashError, Result};

/// A source of cryptographically secure random bytes.
pub trait SecureRandom {
    /// Fills `buf` entirely with random bytes.
    ///
    /// ## Errors
    ///
    /// Returns [`PasswordHashError::RandomSourceUnavailable`] when the source
    /// cannot deliver. Implementations must not fall back to a weaker source.
    fn fill(&mut self, buf: &mut [u8]) -> Result<()>;
}

impl<R: SecureRandom + ?Sized> SecureRandom for &mut R {
    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        (**self).fill(buf)
    }
}

/// The operating system CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl SecureRandom for OsRandom {
    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        OsRng
            .try_fill_bytes(buf)
            .map_err(|e| PasswordHashError::RandomSourceUnavailable(e.to_string()))
    }
}

/// Deterministic generator seeded from a `u64`.
///
/// ## Warning
///
/// Only for reproducible tests. Salts from a known seed are predictable.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl SecureRandom for SeededRandom {
    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        self.rng.fill_bytes(buf);
        Ok(())
    }
}
