//! Export CLI command

use clap::Args;
use std::path::PathBuf;

use crate::error::BooksResult;
use crate::export::{ExportFormat, ExportParams, ExportTarget, Exporter};
use crate::repository::Repository;

#[derive(Args)]
pub struct ExportArgs {
    /// json, yaml, csv-accounts or csv-transactions
    #[arg(short, long, default_value = "json")]
    pub format: ExportFormat,

    /// Directory to write to (defaults to the book's export directory)
    #[arg(short, long, conflicts_with = "dropbox")]
    pub output: Option<PathBuf>,

    /// Upload to Dropbox instead of writing locally
    #[arg(long)]
    pub dropbox: bool,

    /// Back up, then delete the exported transactions
    #[arg(long)]
    pub delete_transactions: bool,
}

/// Export the active book
pub fn handle_export_command(
    repository: &Repository,
    exporter: &Exporter,
    args: ExportArgs,
) -> BooksResult<()> {
    let target = if args.dropbox {
        ExportTarget::Dropbox
    } else {
        match args.output {
            Some(dir) => ExportTarget::Directory(dir),
            None => {
                let active = repository.storage().books().active_book_uid()?;
                ExportTarget::Directory(repository.storage().paths().export_dir(active.as_str()))
            }
        }
    };

    let mut params = ExportParams::new(args.format, target);
    params.delete_transactions_after_export = args.delete_transactions;

    let result = exporter.export(&params)?;
    for destination in &result.destinations {
        println!("Exported to: {}", destination);
    }
    if let Some(deleted) = result.transactions_deleted {
        println!("Deleted {} transaction(s) after export.", deleted);
    }
    Ok(())
}
