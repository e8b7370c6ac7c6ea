//! Election and candidate identifiers.
//!
//! Both are plain monotonically assigned integers. They are encoded big-endian
//! when used as storage keys so that key order matches allocation order.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            pub const fn get(&self) -> u64 {
                self.0
            }

            /// Big-endian key bytes.
            pub fn to_be_bytes(&self) -> [u8; 8] {
                self.0.to_be_bytes()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }
    };
}

numeric_id!(
    /// Unique, never reused election id.
    ElectionId
);

numeric_id!(
    /// Globally unique candidate id, shared across all elections.
    CandidateId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_bytes_sort_like_ids() {
        let a = ElectionId::new(9);
        let b = ElectionId::new(256);
        assert!(a.to_be_bytes() < b.to_be_bytes());
        assert_eq!(u64::from_be_bytes(b.to_be_bytes()), 256);
    }

    #[test]
    fn display_is_bare_number() {
        assert_eq!(CandidateId::new(42).to_string(), "42");
    }
}
