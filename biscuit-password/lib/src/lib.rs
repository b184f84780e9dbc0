//! Salted Argon2 password hashes for the dockhand ecosystem.
//!
//! This crate produces, stores, and verifies memory-hard password hashes
//! using any of the three Argon2 variants:
//!
//! - **Argon2d**: data-dependent memory access
//! - **Argon2i**: data-independent memory access
//! - **Argon2id**: the hybrid of both (default)
//!
//! ## Core Types
//!
//! - [`HashParameters`] - salt/hash lengths and Argon2 cost settings
//! - [`PasswordHash`] - an immutable `salt || hash` buffer with constant-time equality
//! - [`StoredHash`] - a self-describing envelope recording variant and parameters
//! - [`HashContext`] - optional associated data and known secret
//!
//! ## Capabilities
//!
//! - [`SecureRandom`] - salt source ([`OsRandom`] in production, [`SeededRandom`] in tests)
//! - [`Kdf`] - derivation primitive ([`Argon2Kdf`])
//!
//! ## Examples
//!
//! ```rust
//! use biscuit_password::{Argon2Variant, HashContext, HashParameters, PasswordHash};
//!
//! let params = HashParameters::default()
//!     .with_hash_length(32)
//!     .with_parallelism(1)
//!     .with_iterations(1)
//!     .with_memory_kib(64);
//! let ctx = HashContext::new().with_associated_data(b"user-17");
//!
//! let first = PasswordHash::derive(Argon2Variant::Id, b"hunter2", &params, &ctx).unwrap();
//! let second = PasswordHash::derive(Argon2Variant::Id, b"hunter2", &params, &ctx).unwrap();
//!
//! // Fresh salts make every derivation unique
//! assert_ne!(first, second);
//! assert_eq!(first.len(), params.salt_length + params.hash_length);
//!
//! // Verification always recomputes over the stored salt
//! let stored = PasswordHash::from_bytes(first.as_bytes().to_vec(), params.salt_length).unwrap();
//! assert!(stored.verify(Argon2Variant::Id, b"hunter2", &params, &ctx).unwrap());
//! ```
//!
//! ## Resource Use
//!
//! Every derivation allocates roughly `memory_kib` KiB for its own exclusive
//! use and is CPU bound for its whole duration. Callers running many
//! derivations concurrently should bound that concurrency themselves.

mod envelope;
mod error;
mod hash;
mod kdf;
mod params;
mod random;
mod variant;

pub use envelope::{ENVELOPE_VERSION, HEADER_LENGTH, StoredHash};
pub use error::{PasswordHashError, Result};
pub use hash::PasswordHash;
pub use kdf::{Argon2Kdf, HashContext, Kdf};
pub use params::{
    DEFAULT_HASH_LENGTH, DEFAULT_ITERATIONS, DEFAULT_MEMORY_KIB, DEFAULT_PARALLELISM,
    DEFAULT_SALT_LENGTH, HashParameters, MAX_HASH_LENGTH, MAX_MEMORY_KIB, MAX_SALT_LENGTH,
    MIN_MEMORY_PER_LANE_KIB,
};
pub use random::{OsRandom, SecureRandom, SeededRandom};
pub use variant::Argon2Variant;
