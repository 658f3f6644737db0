//! Book CLI commands

use clap::Subcommand;

use crate::display::book::{format_book_details, format_book_list};
use crate::error::{BooksError, BooksResult};
use crate::models::Book;
use crate::repository::Repository;

use super::TerminalUi;

/// Book subcommands
#[derive(Subcommand)]
pub enum BookCommands {
    /// List all books
    List,
    /// Show book details (defaults to the active book)
    Show {
        /// Book name, UID or UID prefix
        book: Option<String>,
    },
    /// Create a new, empty book
    Create {
        /// Display name
        name: String,
        /// Make the new book the active one
        #[arg(long)]
        open: bool,
    },
    /// Make a book the active one
    #[command(alias = "activate")]
    Open {
        /// Book name, UID or UID prefix
        book: String,
    },
    /// Rename a book
    Rename {
        /// Book name, UID or UID prefix
        book: String,
        /// New display name
        name: String,
    },
    /// Delete a book and its ledger (backups are kept)
    Delete {
        /// Book name, UID or UID prefix
        book: String,
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
}

/// Handle a book command
pub fn handle_book_command(repository: &Repository, cmd: BookCommands) -> BooksResult<()> {
    let books = repository.storage().books();

    match cmd {
        BookCommands::List => {
            print!("{}", format_book_list(&books.get_all()?));
        }

        BookCommands::Show { book } => {
            let found = match book {
                Some(identifier) => resolve_book(repository, &identifier)?,
                None => books.active_book()?,
            };
            print!("{}", format_book_details(&found));
        }

        BookCommands::Create { name, open } => {
            let book = repository.create_book(&name)?;
            println!("Created book: {}", book.display_name);
            println!("  UID: {}", book.uid);
            if open {
                repository.load_book(&book.uid, &mut TerminalUi::new())?;
            }
        }

        BookCommands::Open { book } => {
            let found = resolve_book(repository, &book)?;
            repository.load_book(&found.uid, &mut TerminalUi::new())?;
        }

        BookCommands::Rename { book, name } => {
            let found = resolve_book(repository, &book)?;
            let renamed = repository.rename_book(&found.uid, &name)?;
            println!(
                "Renamed book '{}' to '{}'",
                found.display_name, renamed.display_name
            );
        }

        BookCommands::Delete { book, force } => {
            let found = resolve_book(repository, &book)?;
            if !force {
                println!(
                    "WARNING: This deletes every account and transaction of '{}'.",
                    found.display_name
                );
                println!("Its backups are kept. To proceed, run again with --force:");
                println!("  gnucash-books book delete {} --force", found.uid.short());
                return Ok(());
            }
            let deleted = repository.delete_book(&found.uid)?;
            println!("Deleted book: {}", deleted.display_name);
        }
    }

    Ok(())
}

/// Find a book by name, UID or UID prefix
pub(crate) fn resolve_book(repository: &Repository, identifier: &str) -> BooksResult<Book> {
    repository
        .storage()
        .books()
        .find(identifier)?
        .ok_or_else(|| BooksError::book_not_found(identifier))
}
