// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidUuid;

impl fmt::Display for InvalidUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("must be a UUID")
    }
}

impl std::error::Error for InvalidUuid {}

macro_rules! uuid_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            #[must_use]
            pub const fn from_uuid(value: Uuid) -> Self {
                Self(value)
            }

            pub fn parse(input: &str) -> Result<Self, InvalidUuid> {
                Uuid::parse_str(input.trim())
                    .map(Self)
                    .map_err(|_| InvalidUuid)
            }

            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0.hyphenated())
            }
        }

        impl FromStr for $name {
            type Err = InvalidUuid;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }
    };
}

uuid_id!(UnitId);
uuid_id!(OrderId);
uuid_id!(OrgId);
uuid_id!(WorkstationId);
uuid_id!(EventId);

impl EventId {
    /// Fresh random id for a row about to be inserted.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_lowercase_hyphenated() {
        let id = UnitId::parse("0B8D6C1E-3F2A-4C5B-9D8E-7F6A5B4C3D2E").expect("unit id");
        assert_eq!(id.to_string(), "0b8d6c1e-3f2a-4c5b-9d8e-7f6a5b4c3d2e");
    }

    #[test]
    fn rejects_non_uuid_text() {
        assert_eq!(OrderId::parse("order-17"), Err(InvalidUuid));
        assert_eq!(OrderId::parse(""), Err(InvalidUuid));
    }

    #[test]
    fn generated_event_ids_differ() {
        assert_ne!(EventId::generate(), EventId::generate());
    }
}
