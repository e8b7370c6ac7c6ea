//! Caller identity.
//!
//! Signing and authentication happen outside the ledger; by the time an
//! operation reaches the core, the caller is reduced to an opaque,
//! already-authenticated identity string.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Upper bound on identity length, in bytes. Identities are used as storage keys.
pub const MAX_IDENTITY_LEN: usize = 256;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("identity must not be empty")]
    Empty,

    #[error("identity is {0} bytes, longer than the {MAX_IDENTITY_LEN} byte limit")]
    TooLong(usize),

    #[error("identity must not contain whitespace or control characters")]
    InvalidCharacter,
}

/// An authenticated caller (administrator or voter).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity(String);

impl Identity {
    /// Validate and wrap a raw identity string.
    pub fn new(raw: impl Into<String>) -> Result<Self, IdentityError> {
        let s = raw.into();
        if s.is_empty() {
            return Err(IdentityError::Empty);
        }
        if s.len() > MAX_IDENTITY_LEN {
            return Err(IdentityError::TooLong(s.len()));
        }
        if s.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(IdentityError::InvalidCharacter);
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Identity {
    type Error = IdentityError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Identity> for String {
    fn from(identity: Identity) -> Self {
        identity.0
    }
}

impl FromStr for Identity {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
