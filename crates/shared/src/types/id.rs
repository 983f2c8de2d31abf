//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing a `CustomerId` where an
//! `AccountId` is expected. IDs are store-assigned sequence numbers.

use serde::{Deserialize, Serialize};

/// Macro to generate typed ID wrappers over `i64`.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Creates an ID from a raw store value.
            #[must_use]
            pub const fn from_i64(id: i64) -> Self {
                Self(id)
            }

            /// Returns the raw store value.
            #[must_use]
            pub const fn into_inner(self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }
    };
}

typed_id!(CustomerId, "Unique identifier for a customer.");
typed_id!(AccountId, "Unique identifier for an account.");
typed_id!(CardId, "Unique identifier for a card.");
typed_id!(MovementId, "Unique identifier for a ledger movement.");

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_id_roundtrip() {
        let id = AccountId::from_i64(42);
        assert_eq!(id.into_inner(), 42);
        assert_eq!(id.to_string(), "42");
        assert_eq!(AccountId::from_str("42").unwrap(), id);
    }

    #[test]
    fn test_id_ordering() {
        assert!(AccountId::from_i64(1) < AccountId::from_i64(2));
    }

    #[test]
    fn test_id_parse_error() {
        assert!(AccountId::from_str("not-a-number").is_err());
    }
}
