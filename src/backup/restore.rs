//! Restoring books from backup archives

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::config::paths::BookPaths;
use crate::error::{BooksError, BooksResult};
use crate::models::{Book, BookUid};
use crate::preferences::PreferencesManager;
use crate::storage::{BooksDbAdapter, Ledger};

use super::archive::BookArchive;

/// Restores a book's ledger, preferences and registry record from an archive
pub struct RestoreManager {
    paths: BookPaths,
    books: Arc<BooksDbAdapter>,
    preferences: Arc<PreferencesManager>,
}

impl RestoreManager {
    pub fn new(
        paths: BookPaths,
        books: Arc<BooksDbAdapter>,
        preferences: Arc<PreferencesManager>,
    ) -> Self {
        Self {
            paths,
            books,
            preferences,
        }
    }

    /// Restore the book archived in `backup_path`
    ///
    /// The ledger and preferences of that book are overwritten. A book that
    /// is no longer registered is registered again, inactive. Callers must
    /// rebind the ledger adapters if the restored book is the active one.
    pub fn restore_from_file(&self, backup_path: &Path) -> BooksResult<RestoreResult> {
        let archive = BookArchive::read_from(backup_path)
            .map_err(|e| BooksError::Backup(format!("Failed to read backup: {}", e)))?;
        self.restore_from_archive(&archive)
    }

    pub fn restore_from_archive(&self, archive: &BookArchive) -> BooksResult<RestoreResult> {
        // The uid names directories, so reject it before anything is written
        archive
            .book
            .validate()
            .map_err(|e| BooksError::Backup(format!("Backup has an invalid book record: {}", e)))?;
        let uid = archive.book.uid.clone();

        let ledger = Ledger::open(&self.paths, &uid)?;
        ledger.accounts.delete_all()?;
        ledger.transactions.delete_all()?;
        let accounts_restored = ledger.accounts.bulk_add(archive.accounts.clone())?;
        let transactions_restored = ledger.transactions.bulk_add(archive.transactions.clone())?;
        ledger.save()?;

        let prefs = self.preferences.get_book_shared_preferences(&uid)?;
        archive
            .preferences
            .iter()
            .fold(prefs.edit().clear(), |editor, (key, value)| {
                editor.put_value(key, value.clone())
            })
            .apply()?;

        let re_registered = if self.books.contains(&uid)? {
            let display_name = archive.book.display_name.clone();
            let source_uri = archive.book.source_uri.clone();
            self.books.update_record(&uid, |book| {
                book.display_name = display_name;
                book.source_uri = source_uri;
            })?;
            false
        } else {
            let mut book = archive.book.clone();
            book.active = false;
            self.books.add_record(book)?;
            true
        };

        info!(
            book = %uid,
            accounts = accounts_restored,
            transactions = transactions_restored,
            "Restored book from backup"
        );

        Ok(RestoreResult {
            book_uid: uid,
            display_name: archive.book.display_name.clone(),
            backup_date: archive.created_at,
            accounts_restored,
            transactions_restored,
            preferences_restored: archive.preferences.len(),
            re_registered,
        })
    }

    /// Inspect a backup without changing anything
    pub fn validate_backup(&self, backup_path: &Path) -> BooksResult<ValidationResult> {
        let archive = BookArchive::read_from(backup_path)
            .map_err(|e| BooksError::Backup(format!("Failed to read backup: {}", e)))?;

        let mut problems = Vec::new();
        if let Err(e) = archive.book.validate() {
            problems.push(e);
        }
        for account in &archive.accounts {
            if let Err(e) = account.validate() {
                problems.push(format!("Account '{}': {}", account.name, e));
            }
        }
        for txn in &archive.transactions {
            if let Err(e) = txn.validate() {
                problems.push(format!("Transaction '{}': {}", txn.description, e));
            }
        }

        Ok(ValidationResult {
            schema_version: archive.schema_version,
            backup_date: archive.created_at,
            book: archive.book.clone(),
            registered: self.books.contains(&archive.book.uid)?,
            account_count: archive.accounts.len(),
            transaction_count: archive.transactions.len(),
            preference_count: archive.preferences.len(),
            problems,
        })
    }
}

/// Outcome of a restore
#[derive(Debug, Clone)]
pub struct RestoreResult {
    pub book_uid: BookUid,
    pub display_name: String,
    pub backup_date: DateTime<Utc>,
    pub accounts_restored: usize,
    pub transactions_restored: usize,
    pub preferences_restored: usize,
    /// The book had been deleted and was registered again
    pub re_registered: bool,
}

impl RestoreResult {
    pub fn summary(&self) -> String {
        format!(
            "Restored '{}': {} accounts, {} transactions, {} preferences",
            self.display_name,
            self.accounts_restored,
            self.transactions_restored,
            self.preferences_restored
        )
    }
}

/// What a backup file contains
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub schema_version: u32,
    pub backup_date: DateTime<Utc>,
    pub book: Book,
    /// The archived book is currently in the registry
    pub registered: bool,
    pub account_count: usize,
    pub transaction_count: usize,
    pub preference_count: usize,
    pub problems: Vec<String>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.problems.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "{}: {} accounts, {} transactions, {} preferences",
            self.book.display_name,
            self.account_count,
            self.transaction_count,
            self.preference_count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::BackupManager;
    use crate::config::settings::BackupRetention;
    use crate::models::{Account, AccountType};
    use crate::preferences::keys;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        backups: BackupManager,
        restore: RestoreManager,
        books: Arc<BooksDbAdapter>,
        preferences: Arc<PreferencesManager>,
        paths: BookPaths,
        _temp: TempDir,
    }

    fn fixture() -> Fixture {
        let temp = TempDir::new().unwrap();
        let paths = BookPaths::with_base_dir(temp.path().to_path_buf());
        let books = Arc::new(BooksDbAdapter::new(paths.books_file()));
        let preferences = Arc::new(PreferencesManager::new(paths.clone(), Arc::clone(&books)));
        Fixture {
            backups: BackupManager::new(
                paths.clone(),
                Arc::clone(&books),
                Arc::clone(&preferences),
                BackupRetention::default(),
            ),
            restore: RestoreManager::new(paths.clone(), Arc::clone(&books), Arc::clone(&preferences)),
            books,
            preferences,
            paths,
            _temp: temp,
        }
    }

    fn book_with_accounts(fx: &Fixture, name: &str, accounts: usize) -> Book {
        let book = Book::new(name);
        fx.books.add_record(book.clone()).unwrap();
        let ledger = Ledger::open(&fx.paths, &book.uid).unwrap();
        for i in 0..accounts {
            ledger
                .accounts
                .upsert(Account::new(format!("Account {}", i), AccountType::Asset, None, "USD"))
                .unwrap();
        }
        ledger.save().unwrap();
        book
    }

    #[test]
    fn test_restore_recreates_deleted_ledger() {
        let fx = fixture();
        let book = book_with_accounts(&fx, "Household", 3);
        fx.preferences
            .get_book_shared_preferences(&book.uid)
            .unwrap()
            .edit()
            .put_bool(keys::USE_DOUBLE_ENTRY, false)
            .apply()
            .unwrap();
        let backup = fx.backups.backup_book(&book.uid).unwrap();

        fx.books.delete_record(&book.uid).unwrap();
        fs::remove_dir_all(fx.paths.book_dir(book.uid.as_str())).unwrap();
        fx.preferences
            .get_book_shared_preferences(&book.uid)
            .unwrap()
            .edit()
            .clear()
            .apply()
            .unwrap();

        let result = fx.restore.restore_from_file(&backup).unwrap();

        assert!(result.re_registered);
        assert_eq!(result.accounts_restored, 3);
        assert!(fx.paths.accounts_file(book.uid.as_str()).exists());
        assert!(fx.books.contains(&book.uid).unwrap());
        assert!(!fx.books.get_record(&book.uid).unwrap().unwrap().active);
        let prefs = fx.preferences.get_book_shared_preferences(&book.uid).unwrap();
        assert!(!prefs.get_bool(keys::USE_DOUBLE_ENTRY, true).unwrap());
    }

    #[test]
    fn test_restore_overwrites_existing_ledger() {
        let fx = fixture();
        let book = book_with_accounts(&fx, "Household", 2);
        let backup = fx.backups.backup_book(&book.uid).unwrap();

        let ledger = Ledger::open(&fx.paths, &book.uid).unwrap();
        ledger
            .accounts
            .upsert(Account::new("Extra", AccountType::Expense, None, "USD"))
            .unwrap();
        ledger.save().unwrap();

        let result = fx.restore.restore_from_file(&backup).unwrap();

        assert!(!result.re_registered);
        let reopened = Ledger::open(&fx.paths, &book.uid).unwrap();
        assert_eq!(reopened.accounts.count().unwrap(), 2);
        assert!(reopened.accounts.get_by_name("Extra").unwrap().is_none());
    }

    #[test]
    fn test_validate_does_not_touch_data() {
        let fx = fixture();
        let book = book_with_accounts(&fx, "Household", 1);
        let backup = fx.backups.backup_book(&book.uid).unwrap();
        fx.books.delete_record(&book.uid).unwrap();

        let validation = fx.restore.validate_backup(&backup).unwrap();

        assert!(validation.is_valid());
        assert!(!validation.registered);
        assert_eq!(validation.account_count, 1);
        assert!(!fx.books.contains(&book.uid).unwrap());
    }

    fn write_with_uid(fx: &Fixture, backup: &Path, uid: &str) -> std::path::PathBuf {
        let mut archive = BookArchive::read_from(backup).unwrap();
        archive.book.uid = BookUid::from(uid);
        let path = fx.paths.base_dir().join(format!("crafted-{}.json", uid.len()));
        archive.write_json(&path).unwrap();
        path
    }

    #[test]
    fn test_restore_rejects_path_traversal_uid() {
        let fx = fixture();
        let book = book_with_accounts(&fx, "Household", 1);
        let backup = fx.backups.backup_book(&book.uid).unwrap();

        for uid in ["../escaped", "../../escaped", "..", "a/b"] {
            let crafted = write_with_uid(&fx, &backup, uid);
            let err = fx.restore.restore_from_file(&crafted).unwrap_err();
            assert!(matches!(err, BooksError::Backup(_)), "{:?} for {:?}", err, uid);
        }

        // "../escaped" would have resolved to <data>/escaped
        assert!(!fx.paths.base_dir().join("escaped").exists());
        assert!(!fx.paths.preferences_file("../escaped").exists());
        assert_eq!(fx.books.get_all().unwrap().len(), 1);
    }

    #[test]
    fn test_validate_reports_path_traversal_uid() {
        let fx = fixture();
        let book = book_with_accounts(&fx, "Household", 1);
        let backup = fx.backups.backup_book(&book.uid).unwrap();
        let crafted = write_with_uid(&fx, &backup, "../escaped");

        let validation = fx.restore.validate_backup(&crafted).unwrap();

        assert!(!validation.is_valid());
        assert!(validation.problems[0].contains("invalid character"));
        assert!(!validation.registered);
    }

    #[test]
    fn test_restore_missing_file() {
        let fx = fixture();
        let err = fx
            .restore
            .restore_from_file(&fx.paths.base_dir().join("nope.json"))
            .unwrap_err();
        assert!(matches!(err, BooksError::Backup(_)));
    }
}
