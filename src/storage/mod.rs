//! Storage layer for gnucash-books
//!
//! JSON file storage with atomic writes. [`Storage`] owns the books registry
//! and the ledger adapters (accounts and transactions) bound to the active
//! book. After the active book changes, [`Storage::initialize_database_adapters`]
//! must run before the ledger is used again; [`Storage::ledger`] refuses to
//! hand out adapters bound to a book that is no longer active.

pub mod accounts;
pub mod books;
pub mod file_io;
pub mod init;
pub mod transactions;

pub use accounts::AccountRepository;
pub use books::BooksDbAdapter;
pub use file_io::{read_json, read_json_required, write_json_atomic};
pub use init::{create_default_accounts, initialize_storage};
pub use transactions::TransactionRepository;

use std::fs;
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::config::paths::BookPaths;
use crate::error::{BooksError, BooksResult};
use crate::models::{Book, BookUid};

/// The accounts and transactions of one book
#[derive(Debug)]
pub struct Ledger {
    book_uid: BookUid,
    pub accounts: AccountRepository,
    pub transactions: TransactionRepository,
}

impl Ledger {
    /// Open (and load) the ledger files of `book_uid`
    pub fn open(paths: &BookPaths, book_uid: &BookUid) -> BooksResult<Self> {
        book_uid.validate().map_err(BooksError::Validation)?;
        let ledger = Self {
            book_uid: book_uid.clone(),
            accounts: AccountRepository::new(paths.accounts_file(book_uid.as_str())),
            transactions: TransactionRepository::new(
                paths.transactions_file(book_uid.as_str()),
            ),
        };
        ledger.accounts.load()?;
        ledger.transactions.load()?;
        Ok(ledger)
    }

    pub fn book_uid(&self) -> &BookUid {
        &self.book_uid
    }

    pub fn save(&self) -> BooksResult<()> {
        self.accounts.save()?;
        self.transactions.save()
    }

    pub fn is_empty(&self) -> BooksResult<bool> {
        Ok(self.accounts.count()? == 0 && self.transactions.count()? == 0)
    }
}

/// Storage coordinator: books registry plus the active book's ledger
pub struct Storage {
    paths: BookPaths,
    books: Arc<BooksDbAdapter>,
    ledger: RwLock<Option<Arc<Ledger>>>,
}

impl Storage {
    /// Create a Storage instance without loading anything
    pub fn new(paths: BookPaths) -> BooksResult<Self> {
        paths.ensure_directories()?;

        Ok(Self {
            books: Arc::new(BooksDbAdapter::new(paths.books_file())),
            ledger: RwLock::new(None),
            paths,
        })
    }

    /// Create a Storage instance, load the registry and bind the ledger of
    /// the active book (if there is one)
    pub fn open(paths: BookPaths) -> BooksResult<Self> {
        let storage = Self::new(paths)?;
        storage.books.load()?;

        match storage.initialize_database_adapters() {
            Ok(_) | Err(BooksError::NoActiveBook) => Ok(storage),
            Err(e) => Err(e),
        }
    }

    pub fn paths(&self) -> &BookPaths {
        &self.paths
    }

    pub fn books(&self) -> &Arc<BooksDbAdapter> {
        &self.books
    }

    /// Rebind the ledger adapters to the currently active book
    pub fn initialize_database_adapters(&self) -> BooksResult<Arc<Ledger>> {
        let active = self.books.active_book_uid()?;
        let ledger = Arc::new(Ledger::open(&self.paths, &active)?);

        *self
            .ledger
            .write()
            .map_err(|e| BooksError::Storage(format!("Failed to acquire write lock: {}", e)))? =
            Some(Arc::clone(&ledger));

        debug!(book = %active, "Database adapters initialized");
        Ok(ledger)
    }

    /// Ledger adapters of the active book
    pub fn ledger(&self) -> BooksResult<Arc<Ledger>> {
        let current = self
            .ledger
            .read()
            .map_err(|e| BooksError::Storage(format!("Failed to acquire read lock: {}", e)))?
            .clone();

        let ledger = current.ok_or(BooksError::NoActiveBook)?;
        let active = self.books.active_book_uid()?;
        if ledger.book_uid() != &active {
            return Err(BooksError::Storage(format!(
                "Ledger adapters are bound to book {} but book {} is active",
                ledger.book_uid(),
                active
            )));
        }
        Ok(ledger)
    }

    /// Open the ledger of any book, active or not
    pub fn ledger_for(&self, book_uid: &BookUid) -> BooksResult<Ledger> {
        Ledger::open(&self.paths, book_uid)
    }

    /// Register a new, empty book (not activated)
    pub fn create_book(&self, display_name: &str) -> BooksResult<Book> {
        let book = Book::new(display_name.trim());
        self.books.add_record(book.clone())?;
        self.ledger_for(&book.uid)?.save()?;
        Ok(book)
    }

    /// Remove a book record and its ledger files
    pub fn delete_book(&self, book_uid: &BookUid) -> BooksResult<Book> {
        book_uid.validate().map_err(BooksError::Validation)?;
        let book = self.books.delete_record(book_uid)?;
        let dir = self.paths.book_dir(book_uid.as_str());
        if dir.exists() {
            fs::remove_dir_all(&dir).map_err(|e| {
                BooksError::Io(format!("Failed to remove {}: {}", dir.display(), e))
            })?;
        }
        Ok(book)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_storage() -> (Storage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let paths = BookPaths::with_base_dir(temp_dir.path().to_path_buf());
        (Storage::open(paths).unwrap(), temp_dir)
    }

    #[test]
    fn test_open_without_books() {
        let (storage, temp) = create_storage();
        assert!(temp.path().join("books").exists());
        assert!(matches!(storage.ledger(), Err(BooksError::NoActiveBook)));
    }

    #[test]
    fn test_stale_adapters_are_refused() {
        let (storage, _temp) = create_storage();
        let a = storage.create_book("A").unwrap();
        let b = storage.create_book("B").unwrap();

        storage.books().set_active(&a.uid).unwrap();
        storage.initialize_database_adapters().unwrap();
        assert_eq!(storage.ledger().unwrap().book_uid(), &a.uid);

        storage.books().set_active(&b.uid).unwrap();
        assert!(matches!(storage.ledger(), Err(BooksError::Storage(_))));

        storage.initialize_database_adapters().unwrap();
        assert_eq!(storage.ledger().unwrap().book_uid(), &b.uid);
    }

    #[test]
    fn test_delete_book_removes_files() {
        let (storage, _temp) = create_storage();
        let book = storage.create_book("Old").unwrap();
        let dir = storage.paths().book_dir(book.uid.as_str());
        assert!(dir.join("accounts.json").exists());

        storage.delete_book(&book.uid).unwrap();
        assert!(!dir.exists());
        assert_eq!(storage.books().count().unwrap(), 0);
    }

    #[test]
    fn test_ledger_refuses_unsafe_uid() {
        let (storage, temp) = create_storage();
        let err = storage.ledger_for(&BookUid::from("../outside")).unwrap_err();
        assert!(err.is_validation());
        assert!(!temp.path().join("outside").exists());

        let err = storage.delete_book(&BookUid::from("..")).unwrap_err();
        assert!(err.is_validation());
        assert!(temp.path().join("books").exists());
    }
}
