//! Book model
//!
//! A book is an independently persisted ledger. Exactly one book is active
//! at a time; the flag is stored on the record in the books registry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::BookUid;

/// Longest display name, in characters
pub const MAX_DISPLAY_NAME_LEN: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub uid: BookUid,

    /// Name shown in book lists, e.g. "Book 1" or an imported file name
    pub display_name: String,

    /// Where the book was imported from, if anywhere
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_uri: Option<String>,

    #[serde(default)]
    pub active: bool,

    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_opened_at: Option<DateTime<Utc>>,
}

impl Book {
    /// Create an inactive book with a fresh UID
    pub fn new(display_name: impl Into<String>) -> Self {
        Self::with_uid(BookUid::generate(), display_name)
    }

    pub fn with_uid(uid: BookUid, display_name: impl Into<String>) -> Self {
        Self {
            uid,
            display_name: display_name.into(),
            source_uri: None,
            active: false,
            created_at: Utc::now(),
            last_opened_at: None,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        self.uid.validate()?;
        if self.display_name.trim().is_empty() {
            return Err("Book name cannot be empty".into());
        }
        let name_len = self.display_name.chars().count();
        if name_len > MAX_DISPLAY_NAME_LEN {
            return Err(format!(
                "Book name too long ({} characters, max {})",
                name_len, MAX_DISPLAY_NAME_LEN
            ));
        }
        Ok(())
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_name, self.uid.short())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_book_is_inactive() {
        let book = Book::new("Household");
        assert!(!book.active);
        assert!(book.source_uri.is_none());
        assert!(book.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_name() {
        let book = Book::new("   ");
        assert!(book.validate().is_err());
    }

    #[test]
    fn test_validate_counts_characters_not_bytes() {
        let book = Book::new("\u{e9}".repeat(100));
        assert!(book.validate().is_ok());
        assert!(Book::new("\u{e9}".repeat(101)).validate().is_err());
    }

    #[test]
    fn test_validate_rejects_path_like_uid() {
        let book = Book::with_uid(BookUid::from("../../escaped"), "Escaped");
        assert!(book.validate().is_err());
    }

    #[test]
    fn test_display() {
        let book = Book::with_uid(BookUid::from("0123456789abcdef"), "Main");
        assert_eq!(book.to_string(), "Main (01234567)");
    }
}
