//! Typed identifiers.
//!
//! Each record kind gets its own UUIDv7 newtype so a client id can never be
//! passed where a medication id is expected. v7 ids sort by creation time.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

macro_rules! typed_ids {
    ($($(#[$doc:meta])* $name:ident;)+) => {$(
        $(#[$doc])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(text: &str) -> Result<Self, DomainError> {
                text.parse::<Uuid>()
                    .map(Self)
                    .map_err(|err| DomainError::invalid_id(format!("{}: {err}", stringify!($name))))
            }
        }
    )+};
}

typed_ids! {
    /// One stock-keeping unit (a single batch of a product).
    MedicationId;
    /// One ledger entry.
    MovementId;
    AlertId;
    SupplierId;
    /// A customer.
    ClientId;
    /// A person who can sign in and be attributed as actor.
    UserId;
}
