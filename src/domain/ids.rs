//! Type-safe entity identifiers.
//!
//! Each identifier is a newtype wrapper around [`uuid::Uuid`] (v4) so that
//! request, offer, match, and user identifiers cannot be confused with one
//! another at API boundaries.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
        #[serde(transparent)]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Creates a new random identifier (UUID v4).
            #[must_use]
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            /// Wraps an existing [`uuid::Uuid`].
            #[must_use]
            pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner [`uuid::Uuid`].
            #[must_use]
            pub const fn as_uuid(&self) -> &uuid::Uuid {
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
                write!(f, "{}", self.0)
            }
        }

        impl From<uuid::Uuid> for $name {
            fn from(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for uuid::Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

uuid_id! {
    /// Unique identifier for a help request.
    ///
    /// Generated once at creation time and immutable thereafter. Used as the
    /// uniqueness key for match creation and the WebSocket subscription target.
    RequestId
}

uuid_id! {
    /// Unique identifier for a helper offer.
    OfferId
}

uuid_id! {
    /// Unique identifier for a match.
    ///
    /// Threaded through navigation state so that completion always addresses
    /// an explicit match rather than "the most recent one".
    MatchId
}

uuid_id! {
    /// Identifier of an authenticated user (requester or helper).
    UserId
}
