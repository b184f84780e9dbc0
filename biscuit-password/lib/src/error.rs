//! Error types for password hashing.

use thiserror::Error;

/// Errors that can occur while deriving, decoding, or verifying a password hash.
///
/// Messages name the offending field or condition. They never carry password,
/// secret, salt, or hash bytes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordHashError {
    /// A configuration field is zero, or fields are mutually incompatible.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// The secure random source could not produce a salt.
    #[error("secure random source unavailable: {0}")]
    RandomSourceUnavailable(String),

    /// The Argon2 primitive rejected its inputs.
    #[error("derivation failed: {0}")]
    DerivationFailed(String),

    /// A stored buffer or envelope cannot be split into salt and hash.
    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),
}

impl PasswordHashError {
    /// Short, stable name of the error kind, safe to log.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidParameters(_) => "invalid_parameters",
            Self::RandomSourceUnavailable(_) => "random_source_unavailable",
            Self::DerivationFailed(_) => "derivation_failed",
            Self::InvalidEncoding(_) => "invalid_encoding",
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PasswordHashError>;
