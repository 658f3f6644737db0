//! Account CLI commands
//!
//! Accounts always belong to the active book.

use clap::Subcommand;

use crate::display::account::format_account_list;
use crate::error::BooksResult;
use crate::repository::Repository;

/// Account subcommands
#[derive(Subcommand)]
pub enum AccountCommands {
    /// List the accounts of the active book
    List,
    /// Create the default account tree
    Defaults {
        /// Currency code (defaults to the book's default currency)
        #[arg(short, long)]
        currency: Option<String>,
    },
    /// Delete every account and transaction of the active book
    DeleteAll {
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
}

/// Handle an account command
pub fn handle_account_command(repository: &Repository, cmd: AccountCommands) -> BooksResult<()> {
    match cmd {
        AccountCommands::List => {
            let ledger = repository.storage().ledger()?;
            print!("{}", format_account_list(&ledger.accounts.get_all()?));
        }

        AccountCommands::Defaults { currency } => {
            let created = repository.create_default_accounts(currency.as_deref())?;
            println!("Created {} account(s).", created.len());
        }

        AccountCommands::DeleteAll { force } => {
            let book = repository.storage().books().active_book()?;
            if !force {
                println!(
                    "WARNING: This deletes all accounts and transactions of '{}'.",
                    book.display_name
                );
                println!("A backup is made first. To proceed, run again with --force:");
                println!("  gnucash-books account delete-all --force");
                return Ok(());
            }
            let (accounts, transactions) = repository.delete_all_accounts()?;
            println!(
                "Deleted {} account(s) and {} transaction(s) from '{}'.",
                accounts, transactions, book.display_name
            );
        }
    }

    Ok(())
}
