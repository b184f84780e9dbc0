//! Self-describing storage format.
//!
//! The bare `salt || hash` buffer of [`PasswordHash`] cannot be verified
//! without knowing, out of band, which variant and parameters produced it.
//! [`StoredHash`] prefixes that buffer with a fixed 16-byte header so stored
//! hashes stay verifiable after the default policy changes.
//!
//! ## Layout
//!
//! All integers are big-endian.
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0 | 1 | format version (`1`) |
//! | 1 | 1 | variant tag |
//! | 2 | 4 | `memory_kib` |
//! | 6 | 4 | `iterations` |
//! | 10 | 4 | `parallelism` |
//! | 14 | 2 | `salt_length` |
//! | 16 | n | `salt || hash` |
//!
//! The text form is the same bytes in standard base64.
//!
//! ## Examples
//!
//! ```rust
//! use biscuit_password::{Argon2Variant, HashContext, HashParameters, StoredHash};
//!
//! let params = HashParameters::default()
//!     .with_hash_length(32)
//!     .with_parallelism(1)
//!     .with_iterations(1)
//!     .with_memory_kib(64);
//! let ctx = HashContext::new();
//!
//! let stored = StoredHash::new(Argon2Variant::Id, b"s3cret", &params, &ctx).unwrap();
//! let text = stored.to_string();
//!
//! let loaded: StoredHash = text.parse().unwrap();
//! assert!(loaded.verify(b"s3cret", &ctx).unwrap());
//! assert!(loaded.needs_rehash(Argon2Variant::Id, &HashParameters::default()));
//! ```

use std::fmt;
use std::str::FromStr;

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use tracing::warn;

use crate::error::{PasswordHashError, Result};
use crate::hash::PasswordHash;
use crate::kdf::{Argon2Kdf, HashContext, Kdf};
use crate::params::HashParameters;
use crate::random::{OsRandom, SecureRandom};
use crate::variant::Argon2Variant;

/// Current envelope format version.
pub const ENVELOPE_VERSION: u8 = 1;

/// Length of the fixed header preceding `salt || hash`.
pub const HEADER_LENGTH: usize = 16;

/// A [`PasswordHash`] together with the variant and parameters that made it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredHash {
    variant: Argon2Variant,
    params: HashParameters,
    hash: PasswordHash,
}

impl StoredHash {
    /// Derives a fresh hash of `password` and records how it was made.
    ///
    /// ## Errors
    ///
    /// Same as [`PasswordHash::derive`].
    pub fn new(
        variant: Argon2Variant,
        password: &[u8],
        params: &HashParameters,
        context: &HashContext<'_>,
    ) -> Result<Self> {
        Self::new_with(variant, password, params, context, &mut OsRandom, &Argon2Kdf)
    }

    /// Like [`StoredHash::new`] with explicit randomness and derivation
    /// capabilities.
    ///
    /// ## Errors
    ///
    /// See [`StoredHash::new`].
    pub fn new_with<R, K>(
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
        let hash = PasswordHash::derive_with(variant, password, params, context, rng, kdf)?;
        Ok(Self {
            variant,
            params: *params,
            hash,
        })
    }

    /// Wraps an existing hash whose variant and cost parameters are known.
    ///
    /// The length fields of `params` are replaced by the hash's own.
    ///
    /// ## Errors
    ///
    /// Returns [`PasswordHashError::InvalidParameters`] if the resulting
    /// parameters fail validation.
    pub fn from_hash(
        variant: Argon2Variant,
        params: &HashParameters,
        hash: PasswordHash,
    ) -> Result<Self> {
        let params = params
            .with_salt_length(hash.salt_length())
            .with_hash_length(hash.hash_length());
        params.validate()?;
        Ok(Self {
            variant,
            params,
            hash,
        })
    }

    /// Decodes the binary envelope.
    ///
    /// ## Errors
    ///
    /// Returns [`PasswordHashError::InvalidEncoding`] for a truncated header,
    /// an unknown version or variant tag, an impossible salt/hash split, or
    /// recorded parameters that fail validation (including the upper bounds
    /// such as [`MAX_MEMORY_KIB`](crate::MAX_MEMORY_KIB)).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        decode(bytes).inspect_err(|err| {
            warn!(kind = err.kind(), len = bytes.len(), "rejected stored hash envelope");
        })
    }

    /// Encodes the header followed by `salt || hash`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LENGTH + self.hash.len());
        out.push(ENVELOPE_VERSION);
        out.push(self.variant.tag());
        out.extend_from_slice(&self.params.memory_kib.to_be_bytes());
        out.extend_from_slice(&self.params.iterations.to_be_bytes());
        out.extend_from_slice(&self.params.parallelism.to_be_bytes());
        // Validation caps salt_length at u16::MAX.
        out.extend_from_slice(&(self.hash.salt_length() as u16).to_be_bytes());
        out.extend_from_slice(self.hash.as_bytes());
        out
    }

    /// Base64 text form of [`StoredHash::to_bytes`].
    pub fn encode(&self) -> String {
        BASE64.encode(self.to_bytes())
    }

    /// Checks `candidate` using the recorded variant and parameters.
    ///
    /// The header's cost fields are trusted as long as they pass
    /// [`HashParameters::validate`], so a verification may cost up to
    /// [`MAX_MEMORY_KIB`](crate::MAX_MEMORY_KIB) of memory.
    ///
    /// ## Errors
    ///
    /// Propagates [`PasswordHashError::DerivationFailed`]. A wrong password
    /// is `Ok(false)`.
    pub fn verify(&self, candidate: &[u8], context: &HashContext<'_>) -> Result<bool> {
        self.verify_with(candidate, context, &Argon2Kdf)
    }

    /// Like [`StoredHash::verify`] with an explicit derivation capability.
    ///
    /// ## Errors
    ///
    /// See [`StoredHash::verify`].
    pub fn verify_with<K>(&self, candidate: &[u8], context: &HashContext<'_>, kdf: &K) -> Result<bool>
    where
        K: Kdf + ?Sized,
    {
        self.hash
            .verify_with(self.variant, candidate, &self.params, context, kdf)
    }

    /// True when this hash was made with a different variant or parameters
    /// than the `current` policy, so it should be replaced after the next
    /// successful verification.
    pub fn needs_rehash(&self, variant: Argon2Variant, current: &HashParameters) -> bool {
        self.variant != variant || self.params != *current
    }

    pub fn variant(&self) -> Argon2Variant {
        self.variant
    }

    pub fn params(&self) -> &HashParameters {
        &self.params
    }

    pub fn hash(&self) -> &PasswordHash {
        &self.hash
    }

    pub fn into_hash(self) -> PasswordHash {
        self.hash
    }
}

impl fmt::Display for StoredHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for StoredHash {
    type Err = PasswordHashError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = BASE64
            .decode(s.trim())
            .map_err(|e| PasswordHashError::InvalidEncoding(format!("not valid base64: {e}")))?;
        Self::from_bytes(&bytes)
    }
}

fn decode(bytes: &[u8]) -> Result<StoredHash> {
    if bytes.len() < HEADER_LENGTH {
        return Err(PasswordHashError::InvalidEncoding(format!(
            "envelope is {} bytes, header alone needs {HEADER_LENGTH}",
            bytes.len()
        )));
    }

    let version = bytes[0];
    if version != ENVELOPE_VERSION {
        return Err(PasswordHashError::InvalidEncoding(format!(
            "unsupported envelope version {version}"
        )));
    }

    let variant = Argon2Variant::from_tag(bytes[1]).ok_or_else(|| {
        PasswordHashError::InvalidEncoding(format!("unknown variant tag {}", bytes[1]))
    })?;

    let memory_kib = read_u32(bytes, 2);
    let iterations = read_u32(bytes, 6);
    let parallelism = read_u32(bytes, 10);
    let salt_length = usize::from(u16::from_be_bytes([bytes[14], bytes[15]]));

    let hash = PasswordHash::from_bytes(&bytes[HEADER_LENGTH..], salt_length)?;

    let params = HashParameters {
        salt_length,
        hash_length: hash.hash_length(),
        parallelism,
        iterations,
        memory_kib,
    };
    params.validate().map_err(|e| {
        PasswordHashError::InvalidEncoding(format!("recorded parameters rejected: {e}"))
    })?;

    Ok(StoredHash {
        variant,
        params,
        hash,
    })
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_be_bytes(buf)
}
