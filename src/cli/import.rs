//! Import CLI command

use std::path::Path;

use crate::error::{BooksError, BooksResult};
use crate::importer::ImportOutcome;
use crate::repository::Repository;

use super::TerminalUi;

/// Import a book archive (JSON or YAML) as a new book and open it
pub fn handle_import_command(repository: &Repository, file: &Path) -> BooksResult<()> {
    if !file.is_file() {
        return Err(BooksError::Import(format!(
            "File not found: {}",
            file.display()
        )));
    }

    let mut ui = TerminalUi::new();
    let outcome = repository.import_book_file(
        file,
        &mut ui,
        Some(Box::new(|| {
            println!("Run 'gnucash-books account list' to see the imported accounts.");
        })),
    )?;

    match outcome {
        ImportOutcome::Succeeded { .. } => Ok(()),
        ImportOutcome::Failed { message } => Err(BooksError::Import(message)),
    }
}
