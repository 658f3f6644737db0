//! Books registry ("books database")
//!
//! Persists book records in `books.json` and owns the active-book flag.
//! Every mutation is written through immediately: the new state is built on
//! a copy, saved atomically, and only then swapped in, so a failed write
//! never leaves memory and disk disagreeing about which book is active.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{BooksError, BooksResult};
use crate::models::{Book, BookUid};

use super::file_io::{read_json, write_json_atomic};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct BookData {
    books: Vec<Book>,
}

/// Repository for book records and the active-book selector
pub struct BooksDbAdapter {
    path: PathBuf,
    data: RwLock<HashMap<BookUid, Book>>,
}

impl BooksDbAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Load the registry from disk, replacing what is in memory
    pub fn load(&self) -> BooksResult<()> {
        let file_data: BookData = read_json(&self.path)?;
        let mut data = self.write_lock()?;

        data.clear();
        for book in file_data.books {
            data.insert(book.uid.clone(), book);
        }

        debug!(books = data.len(), "Loaded books registry");
        Ok(())
    }

    /// Save the in-memory registry to disk
    pub fn save(&self) -> BooksResult<()> {
        let data = self.read_lock()?;
        persist(&self.path, &data)
    }

    /// Register a new book
    pub fn add_record(&self, book: Book) -> BooksResult<()> {
        book.validate().map_err(BooksError::Validation)?;

        self.mutate(|books| {
            if books.contains_key(&book.uid) {
                return Err(BooksError::Duplicate {
                    entity_type: "Book",
                    identifier: book.uid.to_string(),
                });
            }
            books.insert(book.uid.clone(), book);
            Ok(())
        })
    }

    pub fn get_record(&self, uid: &BookUid) -> BooksResult<Option<Book>> {
        Ok(self.read_lock()?.get(uid).cloned())
    }

    /// All books, oldest first
    pub fn get_all(&self) -> BooksResult<Vec<Book>> {
        let data = self.read_lock()?;
        let mut books: Vec<_> = data.values().cloned().collect();
        books.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.display_name.cmp(&b.display_name))
        });
        Ok(books)
    }

    pub fn get_all_book_uids(&self) -> BooksResult<Vec<BookUid>> {
        Ok(self.get_all()?.into_iter().map(|b| b.uid).collect())
    }

    pub fn contains(&self, uid: &BookUid) -> BooksResult<bool> {
        Ok(self.read_lock()?.contains_key(uid))
    }

    /// Find a book by UID, UID prefix (at least 4 characters) or display name
    pub fn find(&self, identifier: &str) -> BooksResult<Option<Book>> {
        let data = self.read_lock()?;

        if let Some(book) = data.get(&BookUid::from(identifier)) {
            return Ok(Some(book.clone()));
        }

        let by_name = data
            .values()
            .find(|b| b.display_name.eq_ignore_ascii_case(identifier));
        if let Some(book) = by_name {
            return Ok(Some(book.clone()));
        }

        if identifier.len() >= 4 {
            let mut matches = data
                .values()
                .filter(|b| b.uid.as_str().starts_with(identifier));
            if let (Some(book), None) = (matches.next(), matches.next()) {
                return Ok(Some(book.clone()));
            }
        }

        Ok(None)
    }

    /// Make `uid` the only active book and persist the change
    pub fn set_active(&self, uid: &BookUid) -> BooksResult<Book> {
        let activated = self.mutate(|books| {
            if !books.contains_key(uid) {
                return Err(BooksError::book_not_found(uid.as_str()));
            }

            let now = Utc::now();
            for book in books.values_mut() {
                book.active = &book.uid == uid;
                if book.active {
                    book.last_opened_at = Some(now);
                }
            }
            Ok(books.get(uid).cloned())
        })?;

        let book = activated.ok_or_else(|| BooksError::book_not_found(uid.as_str()))?;
        info!(book = %book.uid, name = %book.display_name, "Activated book");
        Ok(book)
    }

    /// UID of the active book
    pub fn active_book_uid(&self) -> BooksResult<BookUid> {
        self.active_book().map(|b| b.uid)
    }

    pub fn active_book(&self) -> BooksResult<Book> {
        self.read_lock()?
            .values()
            .find(|b| b.active)
            .cloned()
            .ok_or(BooksError::NoActiveBook)
    }

    pub fn active_book_display_name(&self) -> BooksResult<String> {
        self.active_book().map(|b| b.display_name)
    }

    /// Apply `update` to a single record and persist it
    pub fn update_record<F>(&self, uid: &BookUid, update: F) -> BooksResult<Book>
    where
        F: FnOnce(&mut Book),
    {
        self.mutate(|books| {
            let book = books
                .get_mut(uid)
                .ok_or_else(|| BooksError::book_not_found(uid.as_str()))?;
            let was_active = book.active;
            update(book);
            // The active flag is only changed through set_active
            book.active = was_active;
            book.validate().map_err(BooksError::Validation)?;
            Ok(book.clone())
        })
    }

    /// Remove a book record; the active book cannot be deleted
    pub fn delete_record(&self, uid: &BookUid) -> BooksResult<Book> {
        self.mutate(|books| {
            match books.get(uid) {
                None => return Err(BooksError::book_not_found(uid.as_str())),
                Some(book) if book.active => {
                    return Err(BooksError::Validation(format!(
                        "Cannot delete the active book '{}'",
                        book.display_name
                    )))
                }
                Some(_) => {}
            }
            books
                .remove(uid)
                .ok_or_else(|| BooksError::book_not_found(uid.as_str()))
        })
    }

    pub fn count(&self) -> BooksResult<usize> {
        Ok(self.read_lock()?.len())
    }

    /// Run `change` on a copy of the registry; persist and publish it only
    /// if both the change and the write succeed
    fn mutate<T, F>(&self, change: F) -> BooksResult<T>
    where
        F: FnOnce(&mut HashMap<BookUid, Book>) -> BooksResult<T>,
    {
        let mut data = self.write_lock()?;
        let mut next = data.clone();
        let result = change(&mut next)?;
        persist(&self.path, &next)?;
        *data = next;
        Ok(result)
    }

    fn read_lock(&self) -> BooksResult<RwLockReadGuard<'_, HashMap<BookUid, Book>>> {
        self.data
            .read()
            .map_err(|e| BooksError::Storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write_lock(&self) -> BooksResult<RwLockWriteGuard<'_, HashMap<BookUid, Book>>> {
        self.data
            .write()
            .map_err(|e| BooksError::Storage(format!("Failed to acquire write lock: {}", e)))
    }
}

fn persist(path: &Path, books: &HashMap<BookUid, Book>) -> BooksResult<()> {
    let mut records: Vec<_> = books.values().cloned().collect();
    records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    write_json_atomic(path, &BookData { books: records })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_adapter() -> (BooksDbAdapter, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let adapter = BooksDbAdapter::new(temp_dir.path().join("books.json"));
        (adapter, temp_dir)
    }

    #[test]
    fn test_no_active_book_initially() {
        let (adapter, _temp) = create_adapter();
        adapter.add_record(Book::new("Book 1")).unwrap();

        assert!(matches!(
            adapter.active_book_uid(),
            Err(BooksError::NoActiveBook)
        ));
    }

    #[test]
    fn test_set_active_is_exclusive() {
        let (adapter, _temp) = create_adapter();
        let a = Book::new("A");
        let b = Book::new("B");
        adapter.add_record(a.clone()).unwrap();
        adapter.add_record(b.clone()).unwrap();

        adapter.set_active(&a.uid).unwrap();
        adapter.set_active(&b.uid).unwrap();

        assert_eq!(adapter.active_book_uid().unwrap(), b.uid);
        let active_count = adapter.get_all().unwrap().iter().filter(|b| b.active).count();
        assert_eq!(active_count, 1);
        assert!(adapter.active_book().unwrap().last_opened_at.is_some());
    }

    #[test]
    fn test_set_active_unknown_book_keeps_state() {
        let (adapter, _temp) = create_adapter();
        let a = Book::new("A");
        adapter.add_record(a.clone()).unwrap();
        adapter.set_active(&a.uid).unwrap();

        let err = adapter.set_active(&BookUid::from("missing")).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(adapter.active_book_uid().unwrap(), a.uid);
    }

    #[test]
    fn test_active_flag_persists() {
        let (adapter, temp) = create_adapter();
        let a = Book::new("A");
        adapter.add_record(a.clone()).unwrap();
        adapter.set_active(&a.uid).unwrap();

        let reopened = BooksDbAdapter::new(temp.path().join("books.json"));
        reopened.load().unwrap();
        assert_eq!(reopened.active_book_uid().unwrap(), a.uid);
    }

    #[test]
    fn test_duplicate_record() {
        let (adapter, _temp) = create_adapter();
        let a = Book::new("A");
        adapter.add_record(a.clone()).unwrap();
        assert!(matches!(
            adapter.add_record(a),
            Err(BooksError::Duplicate { .. })
        ));
    }

    #[test]
    fn test_update_record_cannot_touch_active_flag() {
        let (adapter, _temp) = create_adapter();
        let a = Book::new("A");
        adapter.add_record(a.clone()).unwrap();

        let updated = adapter
            .update_record(&a.uid, |book| {
                book.display_name = "Imported.gnucash".into();
                book.source_uri = Some("/tmp/Imported.gnucash".into());
                book.active = true;
            })
            .unwrap();

        assert_eq!(updated.display_name, "Imported.gnucash");
        assert!(!updated.active);
    }

    #[test]
    fn test_delete_active_book_is_rejected() {
        let (adapter, _temp) = create_adapter();
        let a = Book::new("A");
        let b = Book::new("B");
        adapter.add_record(a.clone()).unwrap();
        adapter.add_record(b.clone()).unwrap();
        adapter.set_active(&a.uid).unwrap();

        assert!(adapter.delete_record(&a.uid).unwrap_err().is_validation());
        adapter.delete_record(&b.uid).unwrap();
        assert_eq!(adapter.count().unwrap(), 1);
    }

    #[test]
    fn test_find_by_name_and_prefix() {
        let (adapter, _temp) = create_adapter();
        let book = Book::with_uid(BookUid::from("abcdef0123456789"), "Household");
        adapter.add_record(book.clone()).unwrap();

        assert_eq!(adapter.find("household").unwrap(), Some(book.clone()));
        assert_eq!(adapter.find("abcd").unwrap(), Some(book.clone()));
        assert_eq!(adapter.find("abc").unwrap(), None);
        assert_eq!(adapter.find("abcdef0123456789").unwrap(), Some(book));
    }
}
