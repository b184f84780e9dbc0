//! Argon2 variant selection.

use std::fmt;
use std::str::FromStr;

use crate::error::PasswordHashError;

/// Which Argon2 mixing function to run.
///
/// - `D` uses data-dependent memory access (strongest against GPU cracking).
/// - `I` uses data-independent memory access (resists side channels).
/// - `Id` is the hybrid of both and the recommended default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Argon2Variant {
    D,
    I,
    #[default]
    Id,
}

impl Argon2Variant {
    /// All variants, in tag order.
    pub const ALL: [Argon2Variant; 3] = [Argon2Variant::D, Argon2Variant::I, Argon2Variant::Id];

    /// Canonical lowercase name, e.g. `"argon2id"`.
    pub fn name(self) -> &'static str {
        match self {
            Self::D => "argon2d",
            Self::I => "argon2i",
            Self::Id => "argon2id",
        }
    }

    /// Stable one-byte tag used by the self-describing envelope.
    pub fn tag(self) -> u8 {
        match self {
            Self::D => 0,
            Self::I => 1,
            Self::Id => 2,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::D),
            1 => Some(Self::I),
            2 => Some(Self::Id),
            _ => None,
        }
    }

    pub(crate) fn algorithm(self) -> argon2::Algorithm {
        match self {
            Self::D => argon2::Algorithm::Argon2d,
            Self::I => argon2::Algorithm::Argon2i,
            Self::Id => argon2::Algorithm::Argon2id,
        }
    }
}

impl fmt::Display for Argon2Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Argon2Variant {
    type Err = PasswordHashError;

    /// Accepts `argon2d`, `argon2i`, `argon2id` or the shorthands `d`, `i`,
    /// `id`, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "argon2d" | "d" => Ok(Self::D),
            "argon2i" | "i" => Ok(Self::I),
            "argon2id" | "id" => Ok(Self::Id),
            other => Err(PasswordHashError::InvalidParameters(format!(
                "unknown Argon2 variant '{other}'"
            ))),
        }
    }
}
