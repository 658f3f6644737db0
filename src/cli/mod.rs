//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the repository.

pub mod account;
pub mod audit;
pub mod backup;
pub mod book;
pub mod dropbox;
pub mod export;
pub mod import;
pub mod prefs;
pub mod settings;
pub mod transaction;

pub use account::{handle_account_command, AccountCommands};
pub use audit::handle_audit_command;
pub use backup::{handle_backup_command, BackupCommands};
pub use book::{handle_book_command, BookCommands};
pub use dropbox::{handle_dropbox_command, DropboxCommands};
pub use export::{handle_export_command, ExportArgs};
pub use import::handle_import_command;
pub use prefs::{handle_prefs_command, PrefsCommands};
pub use settings::{handle_settings_command, SettingsArgs};
pub use transaction::{handle_transaction_command, TransactionCommands};

use crate::models::Book;
use crate::repository::UiHandle;

/// [`UiHandle`] that reports on the terminal
///
/// Progress goes to stderr so that stdout stays parseable.
#[derive(Debug, Default)]
pub struct TerminalUi;

impl TerminalUi {
    pub fn new() -> Self {
        Self
    }
}

impl UiHandle for TerminalUi {
    fn show_progress(&mut self, title: &str) {
        eprintln!("{}...", title);
    }

    fn dismiss_progress(&mut self) {}

    fn notify(&mut self, message: &str) {
        println!("{}", message);
    }

    fn open_ledger(&mut self, book: &Book) {
        println!("Active book: {} ({})", book.display_name, book.uid.short());
    }
}
