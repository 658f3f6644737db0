//! Identifier types
//!
//! Books are keyed by an opaque string UID (GnuCash GUIDs are 32 lowercase
//! hex digits, but any string is accepted). Accounts and transactions use
//! UUID newtypes so they cannot be mixed up at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identifier of a book
///
/// No validation is applied: an identifier that matches no book is still a
/// valid key, e.g. for preference lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookUid(String);

const MAX_BOOK_UID_LEN: usize = 64;

impl BookUid {
    /// Generate a fresh GnuCash-style GUID
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check that the UID can name a directory under the data dir
    ///
    /// Only ASCII letters, digits, `-` and `_` are allowed, so a UID can
    /// never be empty, contain a separator, or be `.`/`..`.
    pub fn validate(&self) -> Result<(), String> {
        if self.0.is_empty() {
            return Err("Book UID cannot be empty".into());
        }
        if self.0.len() > MAX_BOOK_UID_LEN {
            return Err(format!(
                "Book UID too long ({} characters, max {})",
                self.0.len(),
                MAX_BOOK_UID_LEN
            ));
        }
        if let Some(bad) = self
            .0
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(format!("Book UID '{}' contains invalid character {:?}", self.0, bad));
        }
        Ok(())
    }

    /// First eight characters, for compact display
    pub fn short(&self) -> &str {
        self.0.get(..8).unwrap_or(&self.0)
    }
}

impl fmt::Display for BookUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BookUid {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for BookUid {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for BookUid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
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
                write!(f, "{}", self.0.simple())
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            /// Accepts both hyphenated and simple (GUID) forms
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s.trim())?))
            }
        }
    };
}

define_id!(AccountId);
define_id!(TransactionId);
