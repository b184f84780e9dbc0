//! Cost and length configuration for Argon2 password hashes.
//!
//! [`HashParameters`] is plain, immutable data. The defaults are calibrated
//! for interactive login latency:
//!
//! | Field | Default |
//! |-------|---------|
//! | `salt_length` | 16 bytes |
//! | `hash_length` | 128 bytes |
//! | `parallelism` | 2 lanes |
//! | `iterations` | 40 passes |
//! | `memory_kib` | 8192 KiB |
//!
//! Partial configuration documents deserialize with the missing fields
//! filled from these defaults:
//!
//! ```rust
//! use biscuit_password::HashParameters;
//!
//! let params: HashParameters = serde_json::from_str(r#"{"iterations": 3}"#).unwrap();
//! assert_eq!(params.iterations, 3);
//! assert_eq!(params.memory_kib, HashParameters::default().memory_kib);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{PasswordHashError, Result};

/// Default salt length in bytes.
pub const DEFAULT_SALT_LENGTH: usize = 16;

/// Default derived hash length in bytes.
pub const DEFAULT_HASH_LENGTH: usize = 128;

/// Default number of parallel lanes.
pub const DEFAULT_PARALLELISM: u32 = 2;

/// Default number of passes over memory.
pub const DEFAULT_ITERATIONS: u32 = 40;

/// Default memory cost in KiB (8 MiB).
pub const DEFAULT_MEMORY_KIB: u32 = 8192;

/// Minimum memory per lane required by the Argon2 mixing function.
pub const MIN_MEMORY_PER_LANE_KIB: u32 = 8;

/// Largest accepted salt length; also the most the envelope header can record.
pub const MAX_SALT_LENGTH: usize = u16::MAX as usize;

/// Largest accepted derived hash length.
pub const MAX_HASH_LENGTH: usize = 64 * 1024;

/// Largest accepted memory cost (4 GiB).
pub const MAX_MEMORY_KIB: u32 = 4 * 1024 * 1024;

/// Configuration for a password hash derivation.
///
/// Every field is independently overridable. Validation happens when a
/// derivation is invoked (see [`HashParameters::validate`]); out-of-range
/// values are rejected, never clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct HashParameters {
    /// Length of the random salt prepended to the output.
    pub salt_length: usize,
    /// Length of the derived hash appended after the salt.
    pub hash_length: usize,
    /// Number of parallel lanes in the mixing function.
    pub parallelism: u32,
    /// Number of passes over memory.
    pub iterations: u32,
    /// Memory cost in kibibytes.
    pub memory_kib: u32,
}

impl Default for HashParameters {
    fn default() -> Self {
        Self {
            salt_length: DEFAULT_SALT_LENGTH,
            hash_length: DEFAULT_HASH_LENGTH,
            parallelism: DEFAULT_PARALLELISM,
            iterations: DEFAULT_ITERATIONS,
            memory_kib: DEFAULT_MEMORY_KIB,
        }
    }
}

impl HashParameters {
    #[must_use]
    pub fn with_salt_length(mut self, salt_length: usize) -> Self {
        self.salt_length = salt_length;
        self
    }

    #[must_use]
    pub fn with_hash_length(mut self, hash_length: usize) -> Self {
        self.hash_length = hash_length;
        self
    }

    #[must_use]
    pub fn with_parallelism(mut self, parallelism: u32) -> Self {
        self.parallelism = parallelism;
        self
    }

    #[must_use]
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    #[must_use]
    pub fn with_memory_kib(mut self, memory_kib: u32) -> Self {
        self.memory_kib = memory_kib;
        self
    }

    /// Total length of a `salt || hash` buffer produced with these parameters.
    ///
    /// Saturates instead of overflowing; [`HashParameters::validate`] rejects
    /// any lengths where that would matter.
    pub fn output_length(&self) -> usize {
        self.salt_length.saturating_add(self.hash_length)
    }

    /// Checks that every field is positive, that the lengths and memory cost
    /// stay within [`MAX_SALT_LENGTH`], [`MAX_HASH_LENGTH`] and
    /// [`MAX_MEMORY_KIB`], and that `memory_kib` covers `parallelism` lanes.
    ///
    /// Runs before any buffer is allocated, so oversized values are reported
    /// rather than exhausting memory.
    ///
    /// Limits specific to the Argon2 primitive itself (minimum salt length,
    /// minimum output length) are reported by the primitive as
    /// [`PasswordHashError::DerivationFailed`].
    ///
    /// ## Errors
    ///
    /// Returns [`PasswordHashError::InvalidParameters`] naming the first
    /// offending field.
    pub fn validate(&self) -> Result<()> {
        if self.salt_length == 0 {
            return Err(invalid("salt_length must be greater than zero"));
        }
        if self.hash_length == 0 {
            return Err(invalid("hash_length must be greater than zero"));
        }
        if self.parallelism == 0 {
            return Err(invalid("parallelism must be greater than zero"));
        }
        if self.iterations == 0 {
            return Err(invalid("iterations must be greater than zero"));
        }
        if self.memory_kib == 0 {
            return Err(invalid("memory_kib must be greater than zero"));
        }
        if self.salt_length > MAX_SALT_LENGTH {
            return Err(PasswordHashError::InvalidParameters(format!(
                "salt_length {} exceeds the maximum of {MAX_SALT_LENGTH}",
                self.salt_length
            )));
        }
        if self.hash_length > MAX_HASH_LENGTH {
            return Err(PasswordHashError::InvalidParameters(format!(
                "hash_length {} exceeds the maximum of {MAX_HASH_LENGTH}",
                self.hash_length
            )));
        }
        if self.memory_kib > MAX_MEMORY_KIB {
            return Err(PasswordHashError::InvalidParameters(format!(
                "memory_kib {} exceeds the maximum of {MAX_MEMORY_KIB}",
                self.memory_kib
            )));
        }

        let required = u64::from(self.parallelism) * u64::from(MIN_MEMORY_PER_LANE_KIB);
        if u64::from(self.memory_kib) < required {
            return Err(PasswordHashError::InvalidParameters(format!(
                "memory_kib {} is below the {required} KiB required for parallelism {}",
                self.memory_kib, self.parallelism
            )));
        }

        Ok(())
    }
}

fn invalid(reason: &str) -> PasswordHashError {
    PasswordHashError::InvalidParameters(reason.to_string())
}
