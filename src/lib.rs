//! gnucash-books - manage several GnuCash-style books from the command line
//!
//! Every book has its own ledger (accounts and transactions), its own
//! preference store and its own backups. One book at a time is active; the
//! ledger adapters follow whichever book that is.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Paths and global settings
//! - `error`: Custom error types
//! - `models`: Books, accounts, transactions
//! - `storage`: Books registry and per-book JSON ledgers
//! - `preferences`: Per-book preference stores
//! - `backup`: Book archives, backup retention and restore
//! - `importer`: Importing archives as new books on a worker thread
//! - `export`: JSON/YAML/CSV exports, locally or to Dropbox
//! - `repository`: Facade used by front ends
//! - `ui`: Settings screens and their host
//! - `context`: Composition root
//!
//! # Example
//!
//! ```rust,ignore
//! use gnucash_books::config::paths::BookPaths;
//! use gnucash_books::context::AppContext;
//!
//! let ctx = AppContext::initialize(BookPaths::new()?)?;
//! let repository = ctx.repository();
//! repository.backup_active_book()?;
//! ```

pub mod audit;
pub mod backup;
pub mod cli;
pub mod config;
pub mod context;
pub mod display;
pub mod error;
pub mod export;
pub mod importer;
pub mod logging;
pub mod models;
pub mod preferences;
pub mod repository;
pub mod storage;
pub mod ui;

pub use context::AppContext;
pub use error::{BooksError, BooksResult};
pub use repository::{Repository, UiHandle};
