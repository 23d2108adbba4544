//! Entity identifiers
//!
//! Ids are opaque strings. Fresh ids are random (uuid v4, simple form) but
//! any string is accepted so ids survive a backup round trip unchanged.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generate a fresh unique id
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().simple().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

entity_id!(
    /// Participant identifier
    ParticipantId
);

entity_id!(
    /// Prize identifier
    PrizeId
);

entity_id!(
    /// Winner record identifier
    WinnerId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = ParticipantId::generate();
        let b = ParticipantId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 32);
    }

    #[test]
    fn test_id_serializes_as_plain_string() {
        let id = PrizeId::from("grand");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"grand\"");
        let back: PrizeId = serde_json::from_str("\"grand\"").unwrap();
        assert_eq!(back, id);
    }
}
