//! The single-file snapshot of a book
//!
//! Backups, JSON/YAML exports and imports all use this format.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BooksError, BooksResult};
use crate::models::{Account, Book, Transaction};
use crate::storage::{write_json_atomic, Ledger};

pub const ARCHIVE_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookArchive {
    pub schema_version: u32,
    pub created_at: DateTime<Utc>,
    pub book: Book,
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub preferences: BTreeMap<String, serde_json::Value>,
}

impl BookArchive {
    /// Snapshot a book's ledger and preferences
    pub fn capture(
        book: &Book,
        ledger: &Ledger,
        preferences: BTreeMap<String, serde_json::Value>,
    ) -> BooksResult<Self> {
        Ok(Self {
            schema_version: ARCHIVE_SCHEMA_VERSION,
            created_at: Utc::now(),
            book: book.clone(),
            accounts: ledger.accounts.get_all()?,
            transactions: ledger.transactions.get_all()?,
            preferences,
        })
    }

    /// Read an archive, as YAML for `.yaml`/`.yml` files and JSON otherwise
    pub fn read_from(path: &Path) -> BooksResult<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| BooksError::Io(format!("Failed to read {}: {}", path.display(), e)))?;

        if contents.trim().is_empty() {
            return Err(BooksError::Validation(format!(
                "{} is empty",
                path.display()
            )));
        }

        let archive: Self = if is_yaml(path) {
            serde_yaml::from_str(&contents)?
        } else {
            serde_json::from_str(&contents)?
        };

        if archive.schema_version > ARCHIVE_SCHEMA_VERSION {
            return Err(BooksError::Validation(format!(
                "Archive schema version {} is newer than supported version {}",
                archive.schema_version, ARCHIVE_SCHEMA_VERSION
            )));
        }

        Ok(archive)
    }

    pub fn write_json(&self, path: &Path) -> BooksResult<()> {
        write_json_atomic(path, self)
    }

    pub fn write_yaml(&self, path: &Path) -> BooksResult<()> {
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)
            .map_err(|e| BooksError::Io(format!("Failed to write {}: {}", path.display(), e)))
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty() && self.transactions.is_empty()
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AccountType;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn sample_archive() -> BookArchive {
        let mut preferences = BTreeMap::new();
        preferences.insert("use_double_entry".to_string(), serde_json::json!(false));
        BookArchive {
            schema_version: ARCHIVE_SCHEMA_VERSION,
            created_at: Utc::now(),
            book: Book::new("Household"),
            accounts: vec![Account::new("Root Account", AccountType::Root, None, "USD")],
            transactions: Vec::new(),
            preferences,
        }
    }

    #[test]
    fn test_json_and_yaml_read_back_identically() {
        let temp = TempDir::new().unwrap();
        let archive = sample_archive();

        let json_path = temp.path().join("book.json");
        let yaml_path = temp.path().join("book.yml");
        archive.write_json(&json_path).unwrap();
        archive.write_yaml(&yaml_path).unwrap();

        assert_eq!(BookArchive::read_from(&json_path).unwrap(), archive);
        assert_eq!(BookArchive::read_from(&yaml_path).unwrap(), archive);
    }

    #[test]
    fn test_empty_and_malformed_files() {
        let temp = TempDir::new().unwrap();
        let empty = temp.path().join("empty.json");
        fs::write(&empty, "  \n").unwrap();
        assert!(matches!(
            BookArchive::read_from(&empty),
            Err(BooksError::Validation(_))
        ));

        let garbage = temp.path().join("garbage.json");
        fs::write(&garbage, "{\"schema_version\": 1}").unwrap();
        assert!(matches!(
            BookArchive::read_from(&garbage),
            Err(BooksError::Json(_))
        ));
    }

    #[test]
    fn test_newer_schema_rejected() {
        let temp = TempDir::new().unwrap();
        let mut archive = sample_archive();
        archive.schema_version = ARCHIVE_SCHEMA_VERSION + 1;
        let path = temp.path().join("future.json");
        archive.write_json(&path).unwrap();

        assert!(BookArchive::read_from(&path).is_err());
    }
}
