//! Path management for gnucash-books
//!
//! ## Path Resolution Order
//!
//! 1. `GNUCASH_BOOKS_DATA_DIR` environment variable (if set)
//! 2. The platform data directory from `directories::ProjectDirs`
//!    (`~/.local/share/gnucash-books` on Linux)
//!
//! ## Layout
//!
//! ```text
//! <base>/config.json                     settings
//! <base>/books.json                      book registry (the books database)
//! <base>/audit.log                       JSONL audit log
//! <base>/books/<bookUID>/accounts.json   per-book ledger
//! <base>/books/<bookUID>/transactions.json
//! <base>/shared_prefs/<bookUID>.json     per-book preference store
//! <base>/backups/<bookUID>/backup-*.json
//! <base>/exports/<bookUID>/
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use crate::error::BooksError;

/// Environment variable that overrides the base directory
pub const DATA_DIR_ENV: &str = "GNUCASH_BOOKS_DATA_DIR";

/// Manages all paths used by gnucash-books
#[derive(Debug, Clone)]
pub struct BookPaths {
    base_dir: PathBuf,
}

impl BookPaths {
    /// Resolve the base directory from the environment or the platform
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined.
    pub fn new() -> Result<Self, BooksError> {
        let base_dir = match std::env::var(DATA_DIR_ENV) {
            Ok(custom) if !custom.trim().is_empty() => PathBuf::from(custom),
            _ => ProjectDirs::from("org", "gnucash", "gnucash-books")
                .map(|dirs| dirs.data_dir().to_path_buf())
                .ok_or_else(|| {
                    BooksError::Config("Could not determine a data directory".into())
                })?,
        };

        Ok(Self { base_dir })
    }

    /// Create BookPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// The registry of books, their display names and the active flag
    pub fn books_file(&self) -> PathBuf {
        self.base_dir.join("books.json")
    }

    pub fn audit_log(&self) -> PathBuf {
        self.base_dir.join("audit.log")
    }

    /// Directory holding one sub-directory per book
    pub fn books_dir(&self) -> PathBuf {
        self.base_dir.join("books")
    }

    pub fn book_dir(&self, book_uid: &str) -> PathBuf {
        self.books_dir().join(book_uid)
    }

    pub fn accounts_file(&self, book_uid: &str) -> PathBuf {
        self.book_dir(book_uid).join("accounts.json")
    }

    pub fn transactions_file(&self, book_uid: &str) -> PathBuf {
        self.book_dir(book_uid).join("transactions.json")
    }

    pub fn preferences_dir(&self) -> PathBuf {
        self.base_dir.join("shared_prefs")
    }

    /// Preference file for a book; the name is the book UID verbatim
    pub fn preferences_file(&self, book_uid: &str) -> PathBuf {
        self.preferences_dir().join(format!("{}.json", book_uid))
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.base_dir.join("backups")
    }

    pub fn book_backup_dir(&self, book_uid: &str) -> PathBuf {
        self.backup_dir().join(book_uid)
    }

    pub fn export_dir(&self, book_uid: &str) -> PathBuf {
        self.base_dir.join("exports").join(book_uid)
    }

    /// Ensure the top-level directories exist
    pub fn ensure_directories(&self) -> Result<(), BooksError> {
        for dir in [
            self.base_dir.clone(),
            self.books_dir(),
            self.preferences_dir(),
            self.backup_dir(),
        ] {
            std::fs::create_dir_all(&dir).map_err(|e| {
                BooksError::Io(format!("Failed to create {}: {}", dir.display(), e))
            })?;
        }

        Ok(())
    }

    /// Check if the data directory has been initialized (registry exists)
    pub fn is_initialized(&self) -> bool {
        self.books_file().exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_custom_base_dir() {
        let temp_dir = TempDir::new().unwrap();
        let paths = BookPaths::with_base_dir(temp_dir.path().to_path_buf());

        assert_eq!(paths.base_dir(), temp_dir.path());
        assert_eq!(paths.books_file(), temp_dir.path().join("books.json"));
        assert_eq!(
            paths.accounts_file("abc"),
            temp_dir.path().join("books").join("abc").join("accounts.json")
        );
    }

    #[test]
    fn test_preferences_file_is_keyed_by_uid() {
        let paths = BookPaths::with_base_dir(PathBuf::from("/tmp/gc"));
        assert_eq!(
            paths.preferences_file("0123abcd"),
            PathBuf::from("/tmp/gc/shared_prefs/0123abcd.json")
        );
    }

    #[test]
    fn test_ensure_directories() {
        let temp_dir = TempDir::new().unwrap();
        let paths = BookPaths::with_base_dir(temp_dir.path().join("nested"));

        paths.ensure_directories().unwrap();

        assert!(paths.books_dir().exists());
        assert!(paths.preferences_dir().exists());
        assert!(paths.backup_dir().exists());
        assert!(!paths.is_initialized());
    }
}
