//! Branded ID newtypes and record ID generation.
//!
//! [`StudentId`] wraps the stable external identifier the recognition
//! subsystem resolves signals to. It is never generated here — it arrives
//! from outside — so the newtype carries no constructor beyond
//! [`StudentId::from_string`]. Storage row IDs, by contrast, are minted
//! locally as prefixed UUID v7 strings via [`new_record_id`].

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! branded_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create from an existing string value.
            #[must_use]
            pub fn from_string(s: String) -> Self {
                Self(s)
            }

            /// Return the inner string as a slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume self and return the inner `String`.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }

            /// Whether the identifier is empty (invalid for all callers).
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

branded_id!(
    /// Stable external student identifier, resolved upstream by the
    /// recognition subsystem. Not the storage key.
    StudentId
);

/// Generate a new attendance record ID (`att-<uuidv7>`, time-ordered).
#[must_use]
pub fn new_record_id() -> String {
    format!("att-{}", Uuid::now_v7())
}
