//! Per-book preferences
//!
//! Every book has its own preference store, a JSON file named after the
//! book UID under `shared_prefs/`. [`PreferencesManager`] hands out one
//! shared instance per UID, created lazily and kept for the lifetime of the
//! manager.
//!
//! ```rust,ignore
//! let prefs = manager.get_active_book_shared_preferences()?;
//! prefs.edit().put_bool(keys::USE_DOUBLE_ENTRY, false).apply()?;
//! assert!(!manager.is_double_entry_enabled()?);
//! ```

pub mod keys;
mod store;

pub use store::{Editor, SharedPreferences};

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::config::paths::BookPaths;
use crate::error::{BooksError, BooksResult};
use crate::models::BookUid;
use crate::storage::BooksDbAdapter;

/// Currency used when a book has no `default_currency` preference
pub const FALLBACK_CURRENCY: &str = "USD";

pub struct PreferencesManager {
    paths: BookPaths,
    books: Arc<BooksDbAdapter>,
    stores: Mutex<HashMap<BookUid, Arc<SharedPreferences>>>,
}

impl PreferencesManager {
    pub fn new(paths: BookPaths, books: Arc<BooksDbAdapter>) -> Self {
        Self {
            paths,
            books,
            stores: Mutex::new(HashMap::new()),
        }
    }

    /// The preference store of `book_uid`, created on first access
    ///
    /// The UID is not checked against the registry; an unknown UID yields
    /// an empty store.
    pub fn get_book_shared_preferences(
        &self,
        book_uid: &BookUid,
    ) -> BooksResult<Arc<SharedPreferences>> {
        book_uid.validate().map_err(BooksError::Validation)?;
        let mut stores = self
            .stores
            .lock()
            .map_err(|e| BooksError::Storage(format!("Failed to acquire lock: {}", e)))?;

        if let Some(prefs) = stores.get(book_uid) {
            return Ok(Arc::clone(prefs));
        }

        let prefs = Arc::new(SharedPreferences::open(
            book_uid.as_str(),
            self.paths.preferences_file(book_uid.as_str()),
        )?);
        stores.insert(book_uid.clone(), Arc::clone(&prefs));
        debug!(book = %book_uid, "Opened book preferences");

        Ok(prefs)
    }

    /// The preference store of whichever book is active right now
    pub fn get_active_book_shared_preferences(&self) -> BooksResult<Arc<SharedPreferences>> {
        let active = self.books.active_book_uid()?;
        self.get_book_shared_preferences(&active)
    }

    /// Whether the active book requires balanced transactions (default: yes)
    pub fn is_double_entry_enabled(&self) -> BooksResult<bool> {
        self.get_active_book_shared_preferences()?
            .get_bool(keys::USE_DOUBLE_ENTRY, true)
    }

    /// Default currency of the active book
    pub fn default_currency(&self) -> BooksResult<String> {
        Ok(self
            .get_active_book_shared_preferences()?
            .get_string(keys::DEFAULT_CURRENCY)?
            .unwrap_or_else(|| FALLBACK_CURRENCY.to_string()))
    }

    /// Whether opening balances survive a bulk transaction delete
    pub fn should_save_opening_balances(&self) -> BooksResult<bool> {
        self.get_active_book_shared_preferences()?
            .get_bool(keys::SAVE_OPENING_BALANCES, false)
    }
}
