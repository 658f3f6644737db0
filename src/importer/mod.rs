//! Importing books from files
//!
//! An importer turns a source file into a brand-new registered book and
//! returns its UID. [`PendingImport`] runs an importer on a worker thread;
//! the result comes back over a channel to the thread that started it.

mod archive;
mod task;

pub use archive::ArchiveImporter;
pub use task::{ImportOutcome, ImportState, PendingImport};

use std::path::Path;

use crate::error::BooksResult;
use crate::models::BookUid;
use crate::storage::Storage;

/// Creates a new book from a source file
pub trait BookImporter: Send + Sync {
    /// Import `source` as a new book; the book is registered but not activated
    fn import_book(&self, storage: &Storage, source: &Path) -> BooksResult<BookUid>;
}
