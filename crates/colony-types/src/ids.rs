//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Agents, missions, and logged events each get a distinct newtype so the
//! compiler rejects accidental mixing. Freshly minted IDs use UUID v7
//! (time-ordered), so ids sort in creation order. Seeded simulations mint
//! agent ids from their own generator instead, via `from_random_bytes`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Build an identifier from 16 caller-supplied random bytes.
            ///
            /// Lets a seeded generator mint reproducible ids.
            pub fn from_random_bytes(bytes: [u8; 16]) -> Self {
                Self(uuid::Builder::from_random_bytes(bytes).into_uuid())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for an agent (a settler) in the simulation.
    AgentId
}

define_id! {
    /// Unique identifier for a shared mission held by the registry.
    MissionId
}

define_id! {
    /// Unique identifier for an entry in the event log.
    EventId
}
