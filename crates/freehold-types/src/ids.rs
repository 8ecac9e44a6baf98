//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Every entity in the claim engine has a strongly-typed ID to prevent
//! accidental mixing of identifiers at compile time. All IDs use UUID v7
//! (time-ordered) so persisted collections stay roughly insertion-ordered.
//!
//! Player account identifiers arrive from the host platform as plain UUIDs;
//! [`AccountId::SERVER`] is the reserved identifier for server-owned estates.

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
    /// Unique identifier for an estate (a committed land claim).
    EstateId
}

define_id! {
    /// Unique identifier for a player account (or the reserved server account).
    AccountId
}

define_id! {
    /// Unique identifier for a spatial reservation held by the region index.
    ReservationId
}

define_id! {
    /// Unique identifier for a pending expansion request.
    RequestId
}

impl AccountId {
    /// The reserved identifier for server-owned estates.
    ///
    /// Server estates are administrative: they are never billed for upkeep
    /// and never reaped on a ban.
    pub const SERVER: Self = Self(Uuid::nil());

    /// Whether this account is the reserved server account.
    pub fn is_server(self) -> bool {
        self == Self::SERVER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types() {
        let estate = EstateId::new();
        let account = AccountId::new();
        // These are different types -- the compiler enforces no mixing.
        assert_ne!(estate.into_inner(), Uuid::nil());
        assert_ne!(account.into_inner(), Uuid::nil());
    }

    #[test]
    fn server_account_is_nil() {
        assert!(AccountId::SERVER.is_server());
        assert!(!AccountId::new().is_server());
    }

    #[test]
    fn id_roundtrip_serde() {
        let original = EstateId::new();
        let json = serde_json::to_string(&original).ok();
        assert!(json.is_some());
        let restored: Result<EstateId, _> =
            serde_json::from_str(json.as_deref().unwrap_or(""));
        assert!(restored.is_ok());
    }

    #[test]
    fn id_display_matches_uuid() {
        let id = EstateId::new();
        assert_eq!(id.to_string(), id.into_inner().to_string());
    }
}
