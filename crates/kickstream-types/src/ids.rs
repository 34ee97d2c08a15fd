//! Identifier newtypes.
//!
//! All three wrap a [`String`] and serialize as their bare inner value.
//! [`EventId`] is opaque on the wire: consumers accept any string, and the
//! producer mints random UUIDs via [`EventId::generate`]. [`BallId`] and
//! [`PlayerId`] are short human-readable strings (`ball-a`, `player-7`)
//! owned by the reference data.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a string-backed identifier newtype with standard derives.
macro_rules! define_label_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub String);

        impl $name {
            /// Create an identifier from anything string-like.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Borrow the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

define_label_id! {
    /// Unique identifier for an event. Never reused within a process.
    EventId
}

impl EventId {
    /// Mint a fresh identifier from a random (v4) UUID.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

define_label_id! {
    /// Identifier of one of the balls in play (e.g. `ball-a`).
    BallId
}

define_label_id! {
    /// Identifier of a player in the reference table (e.g. `player-7`).
    ///
    /// Events carry this as an unchecked reference; only the display layer
    /// resolves it.
    PlayerId
}
