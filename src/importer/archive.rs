//! Importer for JSON and YAML book archives

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::backup::BookArchive;
use crate::error::{BooksError, BooksResult};
use crate::models::{Book, BookUid, MAX_DISPLAY_NAME_LEN};
use crate::preferences::{keys, PreferencesManager};
use crate::storage::Storage;

use super::BookImporter;

/// Imports a [`BookArchive`] file as a new book
///
/// The book gets a fresh UID, so importing the same file twice yields two
/// books. Account and transaction IDs are kept as they are in the file.
pub struct ArchiveImporter {
    preferences: Arc<PreferencesManager>,
}

impl ArchiveImporter {
    pub fn new(preferences: Arc<PreferencesManager>) -> Self {
        Self { preferences }
    }
}

impl ArchiveImporter {
    fn write_book(&self, storage: &Storage, book: &Book, archive: BookArchive) -> BooksResult<()> {
        // Ledger files first, so a registered book always has them
        let ledger = storage.ledger_for(&book.uid)?;
        ledger.accounts.bulk_add(archive.accounts)?;
        ledger.transactions.bulk_add(archive.transactions)?;
        ledger.save()?;

        storage.books().add_record(book.clone())?;

        self.preferences
            .get_book_shared_preferences(&book.uid)?
            .edit()
            .put_bool(keys::USE_DOUBLE_ENTRY, true)
            .apply()
    }
}

/// Undo whatever part of a failed import reached the disk
fn discard_partial_import(storage: &Storage, book_uid: &BookUid) {
    match storage.books().contains(book_uid) {
        Ok(true) => {
            if let Err(e) = storage.books().delete_record(book_uid) {
                warn!(book = %book_uid, error = %e, "Failed to unregister partially imported book");
            }
        }
        Ok(false) => {}
        Err(e) => warn!(book = %book_uid, error = %e, "Failed to check books registry"),
    }

    let dir = storage.paths().book_dir(book_uid.as_str());
    if dir.exists() {
        if let Err(e) = fs::remove_dir_all(&dir) {
            warn!(dir = %dir.display(), error = %e, "Failed to remove partially imported ledger");
        }
    }
}

impl BookImporter for ArchiveImporter {
    fn import_book(&self, storage: &Storage, source: &Path) -> BooksResult<BookUid> {
        let archive = BookArchive::read_from(source)
            .map_err(|e| BooksError::Import(format!("{}: {}", source.display(), e)))?;

        for account in &archive.accounts {
            account.validate().map_err(|e| {
                BooksError::Import(format!("Invalid account '{}': {}", account.name, e))
            })?;
        }
        for txn in &archive.transactions {
            txn.validate().map_err(|e| {
                BooksError::Import(format!("Invalid transaction '{}': {}", txn.description, e))
            })?;
        }

        let display_name: String = source
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .filter(|stem| !stem.trim().is_empty())
            .unwrap_or_else(|| archive.book.display_name.clone())
            .chars()
            .take(MAX_DISPLAY_NAME_LEN)
            .collect();

        let mut book = Book::new(display_name);
        book.source_uri = Some(source.display().to_string());
        book.validate()
            .map_err(|e| BooksError::Import(format!("{}: {}", source.display(), e)))?;

        if let Err(e) = self.write_book(storage, &book, archive) {
            discard_partial_import(storage, &book.uid);
            return Err(e);
        }

        info!(book = %book.uid, source = %source.display(), "Imported book");
        Ok(book.uid)
    }
}
